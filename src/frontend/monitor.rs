//! Signal monitor application: per-device presence from FFmpeg signalstats
//!
//! Probing runs on a background thread (each candidate device costs a short
//! diagnostic FFmpeg run). For every present device one long-running
//! signalstats process is supervised; its YMIN lines are parsed and
//! classified on the UI thread as they drain from the channel. Events from
//! different devices interleave arbitrarily; within one device, stream order
//! is preserved.

use crate::config::AppConfig;
use crate::frontend::{remember_window_size, LogView};
use crate::probe;
use crate::process::ProcessEvent;
use crate::session::{ProcId, Session};
use crate::signal::{stats_command, SignalLineParser};
use crate::types::{DeviceId, SignalSample};
use crossbeam_channel::{bounded, Receiver};
use egui::{Color32, RichText};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-device monitoring state
struct DeviceMonitor {
    device: DeviceId,
    proc: Option<ProcId>,
    last_sample: Option<SignalSample>,
    exited: Option<String>,
}

/// Main application state for `cxgui-monitor`
pub struct MonitorApp {
    session: Session,
    parser: SignalLineParser,
    devices: Vec<DeviceMonitor>,
    probe_rx: Option<Receiver<crate::error::Result<Vec<DeviceId>>>>,
    log: LogView,
    last_error: Option<String>,
}

impl MonitorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self {
            session: Session::new(config),
            parser: SignalLineParser::new(),
            devices: Vec::new(),
            probe_rx: None,
            log: LogView::new(),
            last_error: None,
        };
        app.start_probe();
        app
    }

    /// Kick off device probing on a background thread
    fn start_probe(&mut self) {
        if self.probe_rx.is_some() {
            return;
        }

        // Tear down existing monitors before re-probing.
        for monitor in self.devices.drain(..) {
            if let Some(id) = monitor.proc {
                if let Err(e) = self.session.terminate(id) {
                    tracing::warn!("Failed to stop monitor process: {}", e);
                }
                self.session.release(id);
            }
        }

        let ffmpeg = PathBuf::from(&self.session.config.ffmpeg_path);
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(probe::probe(&ffmpeg, probe::DEFAULT_MAX_DEVICES));
        });
        self.probe_rx = Some(rx);
        self.log.push("--- probing devices ---".to_string());
    }

    /// Poll the probe result and start one signalstats process per device
    fn poll_probe(&mut self) {
        let Some(rx) = &self.probe_rx else {
            return;
        };
        let Ok(result) = rx.try_recv() else {
            return;
        };
        self.probe_rx = None;

        let present = match result {
            Ok(present) => present,
            Err(e) => {
                self.last_error = Some(format!("Probe failed: {}", e));
                return;
            }
        };

        if present.is_empty() {
            self.log.push("--- no devices found ---".to_string());
            return;
        }

        let ffmpeg = self.session.config.ffmpeg_path.clone();
        for device in present {
            let spec = stats_command(Path::new(&ffmpeg), device);
            let proc = match self.session.spawn(&spec) {
                Ok(id) => Some(id),
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    None
                }
            };
            self.log.push(format!("--- monitoring /dev/cxadc{} ---", device));
            self.devices.push(DeviceMonitor {
                device,
                proc,
                last_sample: None,
                exited: None,
            });
        }
    }

    /// Drain every device's output stream and classify samples
    fn process_events(&mut self) -> bool {
        let mut had_events = false;
        let mut released = Vec::new();

        for monitor in &mut self.devices {
            let Some(id) = monitor.proc else { continue };
            let events = self
                .session
                .process(id)
                .map(|h| h.drain())
                .unwrap_or_default();

            for event in events {
                had_events = true;
                match event {
                    ProcessEvent::Line(line) => {
                        if let Some(sample) = self.parser.sample(monitor.device, &line) {
                            monitor.last_sample = Some(sample);
                        }
                    }
                    ProcessEvent::Exited(kind) => {
                        monitor.exited = Some(kind.to_string());
                        monitor.proc = None;
                        released.push(id);
                    }
                }
            }
        }

        for id in released {
            self.session.release(id);
        }
        had_events
    }
}

fn device_status(monitor: &DeviceMonitor) -> (Color32, String) {
    if let Some(exit) = &monitor.exited {
        return (Color32::GRAY, format!("stopped ({})", exit));
    }
    match monitor.last_sample {
        Some(sample) if sample.present => (
            Color32::GREEN,
            format!("signal (YMIN {:.0})", sample.ymin),
        ),
        Some(sample) => (
            Color32::RED,
            format!("no signal (YMIN {:.0})", sample.ymin),
        ),
        None => (Color32::GRAY, "waiting for data".to_string()),
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_probe();
        self.process_events();
        remember_window_size(ctx, &mut self.session.config);

        egui::TopBottomPanel::top("monitor_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let probing = self.probe_rx.is_some();
                if ui
                    .add_enabled(!probing, egui::Button::new("Probe devices"))
                    .clicked()
                {
                    self.start_probe();
                }
                if probing {
                    ui.spinner();
                    ui.label("Probing...");
                }
                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.colored_label(Color32::LIGHT_RED, RichText::new(error).small());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            for monitor in &self.devices {
                let (color, text) = device_status(monitor);
                ui.horizontal(|ui| {
                    ui.colored_label(color, "●");
                    ui.label(format!("/dev/cxadc{}", monitor.device));
                    ui.label(RichText::new(text).small());
                });
            }

            ui.separator();
            self.log.ui(ui);
        });

        if self.probe_rx.is_some() || self.devices.iter().any(|m| m.proc.is_some()) {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.shutdown();
        self.session.config.save();
    }
}
