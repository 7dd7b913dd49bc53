//! cxgui-workflow: decode a raw capture and export it to playable video

use cxgui::config::AppConfig;
use cxgui::frontend::WorkflowApp;

fn main() -> eframe::Result<()> {
    let _log_guard = cxgui::logging::init("cxgui-workflow");
    tracing::info!("Starting cxgui-workflow");

    let config = AppConfig::load_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width as f32, config.window_height as f32])
            .with_min_inner_size([640.0, 400.0])
            .with_title("CXADC Decode Workflow"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "CXADC Decode Workflow",
        native_options,
        Box::new(|cc| Ok(Box::new(WorkflowApp::new(cc, config)))),
    );

    if let Err(e) = &result {
        cxgui::crash::write_crash_log(&format!("cxgui-workflow failed to start: {}", e));
    }

    result
}
