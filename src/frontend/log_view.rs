//! Ring-buffered process output view
//!
//! Every app streams subprocess output into one of these. Old lines fall off
//! the front so an hours-long FFmpeg run cannot grow memory without bound.

use egui::{RichText, ScrollArea, Ui};
use std::collections::VecDeque;

/// Default line capacity
const DEFAULT_MAX_LINES: usize = 2000;

/// Scrollable, capacity-bounded log of output lines
pub struct LogView {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_LINES)
    }

    pub fn with_capacity(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines.min(256)),
            max_lines: max_lines.max(1),
        }
    }

    /// Append a line, evicting the oldest once at capacity
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the log in a stick-to-bottom scroll area
    pub fn ui(&self, ui: &mut Ui) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.lines {
                    ui.label(RichText::new(line).small().monospace());
                }
            });
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}
