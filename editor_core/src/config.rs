//! Engine configuration.

use serde::Deserialize;

use crate::buffer::DEFAULT_TAB_SIZE;
use crate::history::DEFAULT_CAPACITY;
use crate::scheduler::SchedulerConfig;
use crate::viewport::ViewportConfig;

/// Settings for one editor session. Every field has a default, so a JSON
/// file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tab_size: usize,
    pub history_capacity: usize,
    pub search_case_sensitive: bool,
    /// Treat `/` patterns as regular expressions.
    pub search_regex: bool,
    pub scheduler: SchedulerConfig,
    pub viewport: ViewportConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
            history_capacity: DEFAULT_CAPACITY,
            search_case_sensitive: false,
            search_regex: true,
            scheduler: SchedulerConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}
