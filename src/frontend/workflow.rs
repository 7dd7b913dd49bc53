//! Workflow application: decode a raw capture, then export it
//!
//! The sequencer itself runs on a worker thread (see [`crate::workflow`]);
//! this app validates the request, forwards events into the log, and keeps
//! the state label current. Preconditions are checked synchronously on the
//! Run click, so a bad request never leaves the Idle state.

use crate::config::AppConfig;
use crate::error::CxError;
use crate::frontend::{remember_window_size, LogView};
use crate::session::Session;
use crate::workflow::{
    final_artifact, plan, WorkflowEvent, WorkflowRequest, WorkflowRunner, WorkflowState,
};
use egui::{Color32, RichText};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application state for `cxgui-workflow`
pub struct WorkflowApp {
    session: Session,
    input_file: String,
    output_base: String,
    state: WorkflowState,
    runner: Option<WorkflowRunner>,
    log: LogView,
    last_error: Option<String>,
}

impl WorkflowApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let input_file = config.last_input_file.clone();
        Self {
            session: Session::new(config),
            input_file,
            output_base: String::new(),
            state: WorkflowState::Idle,
            runner: None,
            log: LogView::new(),
            last_error: None,
        }
    }

    fn start(&mut self) {
        let input = PathBuf::from(self.input_file.trim());
        let working_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let request = WorkflowRequest {
            decode_exe: PathBuf::from(&self.session.config.decode_path),
            export_exe: PathBuf::from(&self.session.config.export_path),
            input_file: input,
            output_base: self.output_base.clone(),
            working_dir,
        };

        match plan(&request) {
            Ok(plan) => {
                self.session.config.last_input_file = self.input_file.trim().to_string();
                self.last_error = None;
                self.log.clear();
                self.log.push(format!(
                    "--- target: {} ---",
                    final_artifact(&request.working_dir, &request.output_base).display()
                ));
                self.state = WorkflowState::DecodeRunning;
                self.runner = Some(WorkflowRunner::spawn(plan));
            }
            // Precondition violations surface immediately; no state change.
            Err(CxError::Precondition(msg)) => self.last_error = Some(msg),
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn process_events(&mut self) -> bool {
        let Some(runner) = &self.runner else {
            return false;
        };
        let events = runner.drain();
        let had_events = !events.is_empty();

        for event in events {
            match event {
                WorkflowEvent::StageStarted { stage } => {
                    self.state = match stage {
                        "export" => WorkflowState::ExportRunning,
                        _ => WorkflowState::DecodeRunning,
                    };
                    self.log.push(format!("--- {} stage started ---", stage));
                }
                WorkflowEvent::Line { stage, line } => {
                    self.log.push(format!("[{}] {}", stage, line));
                }
                WorkflowEvent::Finished { state, detail } => {
                    self.state = state;
                    self.log.push(format!("--- {}: {} ---", state, detail));
                    if state == WorkflowState::Failed {
                        self.last_error = Some(detail);
                    }
                    self.runner = None;
                }
            }
        }
        had_events
    }

    fn pick_path_into(target: &mut String, title: &str) {
        if let Some(path) = rfd::FileDialog::new().set_title(title).pick_file() {
            *target = path.display().to_string();
        }
    }
}

impl eframe::App for WorkflowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();
        remember_window_size(ctx, &mut self.session.config);

        let running = self.state.is_running() && self.runner.is_some();

        egui::TopBottomPanel::top("workflow_controls").show(ctx, |ui| {
            egui::Grid::new("workflow_paths")
                .num_columns(3)
                .show(ui, |ui| {
                    ui.label("Decode tool:");
                    ui.add_enabled(
                        !running,
                        egui::TextEdit::singleline(&mut self.session.config.decode_path)
                            .desired_width(320.0),
                    );
                    if ui.add_enabled(!running, egui::Button::new("Browse...")).clicked() {
                        Self::pick_path_into(
                            &mut self.session.config.decode_path,
                            "Select decode executable",
                        );
                    }
                    ui.end_row();

                    ui.label("Export tool:");
                    ui.add_enabled(
                        !running,
                        egui::TextEdit::singleline(&mut self.session.config.export_path)
                            .desired_width(320.0),
                    );
                    if ui.add_enabled(!running, egui::Button::new("Browse...")).clicked() {
                        Self::pick_path_into(
                            &mut self.session.config.export_path,
                            "Select tbc-video-export executable",
                        );
                    }
                    ui.end_row();

                    ui.label("Input capture:");
                    ui.add_enabled(
                        !running,
                        egui::TextEdit::singleline(&mut self.input_file).desired_width(320.0),
                    );
                    if ui.add_enabled(!running, egui::Button::new("Browse...")).clicked() {
                        Self::pick_path_into(&mut self.input_file, "Select raw capture");
                    }
                    ui.end_row();

                    ui.label("Output base:");
                    ui.add_enabled(
                        !running,
                        egui::TextEdit::singleline(&mut self.output_base).desired_width(320.0),
                    );
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                if running {
                    if ui.button("Stop").clicked() {
                        if let Some(runner) = &self.runner {
                            runner.stop();
                        }
                    }
                } else if ui.button("Run").clicked() {
                    self.start();
                }

                ui.separator();
                let state_color = match self.state {
                    WorkflowState::Done => Color32::GREEN,
                    WorkflowState::Failed => Color32::RED,
                    WorkflowState::Idle => Color32::GRAY,
                    _ => Color32::YELLOW,
                };
                ui.colored_label(state_color, self.state.to_string());

                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.colored_label(Color32::LIGHT_RED, RichText::new(error).small());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.log.ui(ui);
        });

        if running {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Join the worker so the stage in flight is gone before the process
        // exits; a bare stop request would leave the child orphaned.
        if let Some(runner) = self.runner.take() {
            runner.shutdown();
        }
        self.session.shutdown();
        self.session.config.save();
    }
}
