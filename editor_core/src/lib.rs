//! Modal Edit Core - Vim-style modal editing logic.
//!
//! Motions, operators and the mode state machine work against any buffer
//! implementing [`EditorContext`]. Alongside them live the incremental edit
//! calculator and the debounced, viewport-aware tokenization that keeps a
//! syntax tree in step with the buffer. Nothing here depends on a window,
//! a terminal or a clock; callers pass `Instant`s in.

pub mod buffer;
pub mod cadence;
pub mod config;
pub mod context;
pub mod edit;
pub mod editor;
pub mod error;
pub mod history;
pub mod key;
pub mod modal;
pub mod mode;
pub mod motion;
pub mod operator;
pub mod position;
pub mod register;
pub mod scheduler;
pub mod search;
pub mod syntax;
pub mod viewport;

pub use buffer::TextBuffer;
pub use config::EngineConfig;
pub use context::{EditorContext, Snapshot};
pub use edit::{compute_edit, Edit, EditComplexity};
pub use editor::Editor;
pub use error::EditError;
pub use history::{EditOperation, History};
pub use key::Key;
pub use modal::{KeyEnv, KeyOutcome, ModalEngine};
pub use mode::Mode;
pub use motion::{Motion, MotionMeta, VimRange};
pub use operator::{apply_outcome, Operator, OperatorOutcome};
pub use position::{Point, Position};
pub use register::{Register, RegisterWrite, UnnamedRegister};
pub use scheduler::{SchedulerConfig, TokenizationScheduler};
pub use search::{Search, SearchMatch};
pub use viewport::{ViewportConfig, ViewportRange, ViewportTracker};
