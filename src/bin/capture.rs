//! cxgui-capture: record RF from a CXADC device and preview it

use cxgui::config::AppConfig;
use cxgui::frontend::CaptureApp;

fn main() -> eframe::Result<()> {
    let _log_guard = cxgui::logging::init("cxgui-capture");
    tracing::info!("Starting cxgui-capture");

    let config = AppConfig::load_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width as f32, config.window_height as f32])
            .with_min_inner_size([640.0, 400.0])
            .with_title("CXADC Capture"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "CXADC Capture",
        native_options,
        Box::new(|cc| Ok(Box::new(CaptureApp::new(cc, config)))),
    );

    if let Err(e) = &result {
        cxgui::crash::write_crash_log(&format!("cxgui-capture failed to start: {}", e));
    }

    result
}
