//! Capture application: record RF from a CXADC device, preview via mpv
//!
//! One supervised FFmpeg process writes the raw sample stream to disk; an
//! optional mpv process previews the device as raw video. Both stream their
//! diagnostics into the log view. A device held by another process shows up
//! here as FFmpeg's own error line plus a nonzero exit surfaced in the
//! status strip.

use crate::capture::{default_output_name, preview_command, record_command};
use crate::config::AppConfig;
use crate::frontend::{remember_window_size, LogView};
use crate::process::ProcessEvent;
use crate::session::{ProcId, Session};
use crate::types::{DeviceId, ExitKind};
use egui::{Color32, RichText};
use std::path::Path;
use std::time::Duration;

/// Main application state for `cxgui-capture`
pub struct CaptureApp {
    session: Session,
    device: DeviceId,
    output_path: String,
    recorder: Option<ProcId>,
    /// Set when the user pressed Stop, so the forced exit is not an error
    recorder_stopping: bool,
    preview: Option<ProcId>,
    log: LogView,
    last_error: Option<String>,
}

impl CaptureApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            session: Session::new(config),
            device: 0,
            output_path: default_output_name(),
            recorder: None,
            recorder_stopping: false,
            preview: None,
            log: LogView::new(),
            last_error: None,
        }
    }

    fn start_recording(&mut self) {
        let output = self.output_path.trim().to_string();
        if output.is_empty() {
            self.last_error = Some("Output file name is empty".to_string());
            return;
        }
        if !confirm_overwrite(Path::new(&output)) {
            return;
        }

        let spec = record_command(
            Path::new(&self.session.config.ffmpeg_path),
            self.device,
            Path::new(&output),
        );
        match self.session.spawn(&spec) {
            Ok(id) => {
                self.recorder = Some(id);
                self.recorder_stopping = false;
                self.last_error = None;
                self.log.push(format!(
                    "--- recording /dev/cxadc{} to {} ---",
                    self.device, output
                ));
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn stop_recording(&mut self) {
        if let Some(id) = self.recorder {
            self.recorder_stopping = true;
            if let Err(e) = self.session.terminate(id) {
                tracing::warn!("Failed to stop recorder: {}", e);
            }
        }
    }

    fn toggle_preview(&mut self) {
        match self.preview {
            Some(id) => {
                if let Err(e) = self.session.terminate(id) {
                    tracing::warn!("Failed to stop preview: {}", e);
                }
            }
            None => {
                let spec = preview_command(
                    Path::new(&self.session.config.mpv_path),
                    self.device,
                );
                match self.session.spawn(&spec) {
                    Ok(id) => self.preview = Some(id),
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
        }
    }

    /// Drain subprocess events into the log; returns true if anything arrived
    fn process_events(&mut self) -> bool {
        let mut had_events = false;

        if let Some(id) = self.recorder {
            let events = self
                .session
                .process(id)
                .map(|h| h.drain())
                .unwrap_or_default();
            for event in events {
                had_events = true;
                match event {
                    ProcessEvent::Line(line) => self.log.push(line),
                    ProcessEvent::Exited(kind) => {
                        self.log.push(format!("--- recorder finished: {} ---", kind));
                        if !kind.success() && !self.recorder_stopping {
                            self.last_error = Some(format!("Recording failed ({})", kind));
                        }
                        self.session.release(id);
                        self.recorder = None;
                        self.recorder_stopping = false;
                    }
                }
            }
        }

        if let Some(id) = self.preview {
            let events = self
                .session
                .process(id)
                .map(|h| h.drain())
                .unwrap_or_default();
            for event in events {
                had_events = true;
                match event {
                    // Preview chatter is noise; only its end is interesting.
                    ProcessEvent::Line(_) => {}
                    ProcessEvent::Exited(kind) => {
                        if let ExitKind::Code(code) = kind {
                            if code != 0 {
                                self.log.push(format!("--- preview exited with code {} ---", code));
                            }
                        }
                        self.session.release(id);
                        self.preview = None;
                    }
                }
            }
        }

        had_events
    }
}

/// Ask before an existing output file is clobbered
///
/// Covers paths typed directly into the text field; the save dialog already
/// confirms its own picks. Missing files need no confirmation.
fn confirm_overwrite(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Overwrite capture?")
        .set_description(format!(
            "{} already exists and will be overwritten.",
            path.display()
        ))
        .set_buttons(rfd::MessageButtons::OkCancel)
        .show()
        == rfd::MessageDialogResult::Ok
}

impl eframe::App for CaptureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();
        remember_window_size(ctx, &mut self.session.config);

        let recording = self.recorder.is_some();
        let previewing = self.preview.is_some();

        egui::TopBottomPanel::top("capture_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Device:");
                ui.add_enabled(
                    !recording && !previewing,
                    egui::DragValue::new(&mut self.device).range(0..=7),
                );

                ui.separator();

                ui.label("Output:");
                ui.add_enabled(
                    !recording,
                    egui::TextEdit::singleline(&mut self.output_path).desired_width(280.0),
                );
                if ui.add_enabled(!recording, egui::Button::new("Browse...")).clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_file_name(default_output_name())
                        .save_file()
                    {
                        self.output_path = path.display().to_string();
                    }
                }

                ui.separator();

                if recording {
                    if ui.button("Stop").clicked() {
                        self.stop_recording();
                    }
                } else if ui.button("Record").clicked() {
                    self.start_recording();
                }

                let preview_label = if previewing { "Stop Preview" } else { "Preview" };
                if ui.button(preview_label).clicked() {
                    self.toggle_preview();
                }
            });
        });

        egui::TopBottomPanel::bottom("capture_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if recording {
                    ui.colored_label(Color32::RED, "●");
                    ui.label(RichText::new("Recording").small());
                } else {
                    ui.colored_label(Color32::GRAY, "●");
                    ui.label(RichText::new("Idle").small());
                }
                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.colored_label(Color32::LIGHT_RED, RichText::new(error).small());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.log.ui(ui);
        });

        if recording || previewing {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.shutdown();
        self.session.config.save();
    }
}
