//! Frontend module for the egui UIs
//!
//! Three small applications share this layer, one per binary:
//!
//! - [`CaptureApp`] - record RF from a device and preview it
//! - [`MonitorApp`] - per-device signal presence from FFmpeg signalstats
//! - [`WorkflowApp`] - decode then export a raw capture
//!
//! All three follow the same pattern: background workers push events over
//! crossbeam channels, and the UI thread drains them with `try_recv` inside
//! `update`. No worker ever touches UI state directly.

pub mod capture;
pub mod log_view;
pub mod monitor;
pub mod workflow;

pub use capture::CaptureApp;
pub use log_view::LogView;
pub use monitor::MonitorApp;
pub use workflow::WorkflowApp;

use crate::config::AppConfig;

/// Record the current window size into the config so the next session can
/// restore it
pub fn remember_window_size(ctx: &egui::Context, config: &mut AppConfig) {
    apply_window_rect(ctx.content_rect(), config);
}

fn apply_window_rect(rect: egui::Rect, config: &mut AppConfig) {
    if rect.width() > 0.0 && rect.height() > 0.0 {
        config.window_width = rect.width() as u32;
        config.window_height = rect.height() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rect_is_recorded() {
        let mut config = AppConfig::default();
        apply_window_rect(
            egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1024.0, 768.0)),
            &mut config,
        );
        assert_eq!(config.window_width, 1024);
        assert_eq!(config.window_height, 768);
    }

    #[test]
    fn test_degenerate_rect_keeps_previous_size() {
        let mut config = AppConfig::default();
        apply_window_rect(egui::Rect::ZERO, &mut config);
        assert_eq!(config.window_width, 900);
        assert_eq!(config.window_height, 600);
    }
}
