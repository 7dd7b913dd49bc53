//! cxgui-monitor: per-device signal presence display

use cxgui::config::AppConfig;
use cxgui::frontend::MonitorApp;

fn main() -> eframe::Result<()> {
    let _log_guard = cxgui::logging::init("cxgui-monitor");
    tracing::info!("Starting cxgui-monitor");

    let config = AppConfig::load_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width as f32, config.window_height as f32])
            .with_min_inner_size([480.0, 320.0])
            .with_title("CXADC Signal Monitor"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "CXADC Signal Monitor",
        native_options,
        Box::new(|cc| Ok(Box::new(MonitorApp::new(cc, config)))),
    );

    if let Err(e) = &result {
        cxgui::crash::write_crash_log(&format!("cxgui-monitor failed to start: {}", e));
    }

    result
}
