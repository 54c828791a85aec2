//! Visible-line window tracking.
//!
//! The tracker turns the renderer's scroll offset and pixel height into a
//! padded line range and reports it only when it moved enough to matter.

use serde::Deserialize;

/// Viewport tracking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Lines of padding added above and below the visible area.
    pub buffer_lines: usize,
    /// Moves of at most this many lines are not reported.
    pub small_change_threshold: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            buffer_lines: 10,
            small_change_threshold: 5,
        }
    }
}

/// Lines to (re)tokenize or render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRange {
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
}

impl ViewportRange {
    /// A range covering a whole buffer.
    pub fn whole(total_lines: usize) -> Self {
        Self {
            start_line: 0,
            end_line: total_lines.saturating_sub(1),
            total_lines,
        }
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }
}

/// Unpadded visible area, in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
    pub top_line: usize,
    pub visible_lines: usize,
}

/// Per-buffer viewport state.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    config: ViewportConfig,
    range: Option<ViewportRange>,
    geometry: Option<ViewportGeometry>,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl ViewportTracker {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            range: None,
            geometry: None,
        }
    }

    /// The last reported range.
    pub fn range(&self) -> Option<ViewportRange> {
        self.range
    }

    /// The most recent visible area, reported or not.
    pub fn geometry(&self) -> Option<ViewportGeometry> {
        self.geometry
    }

    /// Recomputes the range from scroll state.
    ///
    /// Returns the new range when it differs from the last reported one by
    /// more than the small-change threshold, the line count changed, or no
    /// range was reported yet.
    pub fn update(
        &mut self,
        scroll_top: f32,
        visible_height: f32,
        line_height: f32,
        total_lines: usize,
    ) -> Option<ViewportRange> {
        if line_height <= 0.0 || !scroll_top.is_finite() || !visible_height.is_finite() {
            log::debug!("ignoring viewport update with line height {}", line_height);
            return None;
        }
        let total_lines = total_lines.max(1);
        let last = total_lines - 1;

        let first_visible = (scroll_top.max(0.0) / line_height).floor() as usize;
        let last_visible =
            ((scroll_top.max(0.0) + visible_height.max(0.0)) / line_height).floor() as usize;
        self.geometry = Some(ViewportGeometry {
            top_line: first_visible.min(last),
            visible_lines: last_visible.saturating_sub(first_visible).max(1),
        });

        let candidate = ViewportRange {
            start_line: first_visible.saturating_sub(self.config.buffer_lines).min(last),
            end_line: last_visible.saturating_add(self.config.buffer_lines).min(last),
            total_lines,
        };

        let changed = match self.range {
            None => true,
            Some(prev) => {
                prev.total_lines != candidate.total_lines
                    || prev.start_line.abs_diff(candidate.start_line)
                        > self.config.small_change_threshold
                    || prev.end_line.abs_diff(candidate.end_line)
                        > self.config.small_change_threshold
            }
        };

        if changed {
            log::trace!(
                "viewport range {}..={} of {}",
                candidate.start_line,
                candidate.end_line,
                candidate.total_lines
            );
            self.range = Some(candidate);
            Some(candidate)
        } else {
            None
        }
    }

    /// Forgets the reported range so the next update is always reported.
    pub fn reset(&mut self) {
        self.range = None;
    }
}
