//! Two-stage decode/export workflow sequencer
//!
//! Turns a raw RF capture into a playable video by running two external
//! tools back to back: the decode tool produces `<base>.tbc`, then
//! tbc-video-export consumes it and produces `<base>.tbcexported.mkv`.
//!
//! # State machine
//!
//! `Idle → DecodeRunning → ExportRunning → Done`, with `Failed` reachable
//! from either running state. The export stage starts only when decode exits
//! with code exactly 0; there is no retry anywhere. Overall success
//! additionally requires the final artifact to exist on disk — a zero exit
//! from the export tool with a missing file still counts as failure. The
//! decode stage, by contrast, is trusted on its exit code alone; the two
//! checks are deliberately not unified, matching the tools' observed
//! behavior (the export tool has been seen exiting 0 without writing its
//! output).
//!
//! Stop is accepted from either running state and forces `Failed` through
//! the supervisor's terminate.

use crate::error::{CxError, Result};
use crate::process::{self, CommandSpec, ProcessEvent};
use crate::types::ExitKind;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Extension of the intermediate decode artifact
const TBC_SUFFIX: &str = ".tbc";

/// Suffix of the final export artifact
const EXPORT_SUFFIX: &str = ".tbcexported.mkv";

/// States of the workflow sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    DecodeRunning,
    ExportRunning,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn is_running(&self) -> bool {
        matches!(self, WorkflowState::DecodeRunning | WorkflowState::ExportRunning)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::DecodeRunning => "Decoding",
            WorkflowState::ExportRunning => "Exporting",
            WorkflowState::Done => "Done",
            WorkflowState::Failed => "Failed",
        };
        write!(f, "{}", text)
    }
}

/// One pipeline stage: what to run and what it is expected to produce
#[derive(Debug, Clone)]
pub struct StageDescriptor {
    /// Stage name for display and error reporting
    pub name: &'static str,
    /// Command to supervise
    pub command: CommandSpec,
    /// Artifact the stage is expected to produce
    pub artifact: PathBuf,
}

/// User-supplied inputs for a workflow run
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    /// Path to the decode executable
    pub decode_exe: PathBuf,
    /// Path to the tbc-video-export executable
    pub export_exe: PathBuf,
    /// Raw capture file to decode
    pub input_file: PathBuf,
    /// Base name for both artifacts, must be non-empty
    pub output_base: String,
    /// Directory the stages run in and write artifacts to
    pub working_dir: PathBuf,
}

/// A validated two-stage plan
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    pub decode: StageDescriptor,
    pub export: StageDescriptor,
}

/// Events emitted by a running workflow
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A stage began executing
    StageStarted { stage: &'static str },
    /// One output line from the current stage
    Line { stage: &'static str, line: String },
    /// The workflow reached a terminal state; always the last event
    Finished { state: WorkflowState, detail: String },
}

/// Validate a request and build the stage chain
///
/// Fails with [`CxError::Precondition`] when either executable or the input
/// file is missing, or the output base is empty. A failed plan changes no
/// state.
pub fn plan(request: &WorkflowRequest) -> Result<WorkflowPlan> {
    if request.output_base.trim().is_empty() {
        return Err(CxError::Precondition("output base name is empty".into()));
    }
    for (label, path) in [
        ("decode executable", &request.decode_exe),
        ("export executable", &request.export_exe),
        ("input file", &request.input_file),
    ] {
        if !path.exists() {
            return Err(CxError::Precondition(format!(
                "{} does not exist: {}",
                label,
                path.display()
            )));
        }
    }

    let base = request.output_base.trim();
    let tbc_name = format!("{}{}", base, TBC_SUFFIX);
    let export_name = format!("{}{}", base, EXPORT_SUFFIX);

    let decode = StageDescriptor {
        name: "decode",
        command: CommandSpec::new(&request.decode_exe)
            .arg(request.input_file.display().to_string())
            .arg(base)
            .working_dir(&request.working_dir),
        artifact: request.working_dir.join(&tbc_name),
    };
    let export = StageDescriptor {
        name: "export",
        command: CommandSpec::new(&request.export_exe)
            .args([tbc_name, export_name.clone()])
            .working_dir(&request.working_dir),
        artifact: request.working_dir.join(&export_name),
    };

    Ok(WorkflowPlan { decode, export })
}

/// Execute a plan to completion on the calling thread
///
/// Emits [`WorkflowEvent`]s to `events` and returns the terminal state. The
/// stop flag forces termination of the stage in flight.
pub fn run_plan(
    plan: &WorkflowPlan,
    events: &Sender<WorkflowEvent>,
    stop: &AtomicBool,
) -> WorkflowState {
    // Stage A: trusted on its exit code.
    match run_stage(&plan.decode, events, stop) {
        Ok(kind) if kind.success() => {}
        Ok(kind) => {
            return finish_failed(events, format!("decode stage failed ({})", kind));
        }
        Err(e) => {
            return finish_failed(events, format!("decode stage failed: {}", e));
        }
    }

    // Stage B: exit code AND the filesystem are consulted.
    match run_stage(&plan.export, events, stop) {
        Ok(kind) if kind.success() => {
            if plan.export.artifact.exists() {
                let detail = format!("created {}", plan.export.artifact.display());
                let _ = events.send(WorkflowEvent::Finished {
                    state: WorkflowState::Done,
                    detail,
                });
                WorkflowState::Done
            } else {
                finish_failed(
                    events,
                    format!(
                        "export exited 0 but {} was not created",
                        plan.export.artifact.display()
                    ),
                )
            }
        }
        Ok(kind) => finish_failed(events, format!("export stage failed ({})", kind)),
        Err(e) => finish_failed(events, format!("export stage failed: {}", e)),
    }
}

/// Run one stage under supervision, forwarding its output
fn run_stage(
    stage: &StageDescriptor,
    events: &Sender<WorkflowEvent>,
    stop: &AtomicBool,
) -> Result<ExitKind> {
    let handle = process::spawn(&stage.command)?;
    let _ = events.send(WorkflowEvent::StageStarted { stage: stage.name });
    tracing::info!("Stage '{}' started (pid {})", stage.name, handle.pid());

    let mut terminate_sent = false;
    loop {
        if stop.load(Ordering::SeqCst) && !terminate_sent {
            terminate_sent = true;
            if let Err(e) = handle.terminate() {
                tracing::warn!("Failed to terminate stage '{}': {}", stage.name, e);
            }
        }

        match handle.events().recv_timeout(Duration::from_millis(100)) {
            Ok(ProcessEvent::Line(line)) => {
                let _ = events.send(WorkflowEvent::Line {
                    stage: stage.name,
                    line,
                });
            }
            Ok(ProcessEvent::Exited(kind)) => {
                tracing::info!("Stage '{}' finished: {}", stage.name, kind);
                if terminate_sent {
                    return Err(CxError::stage(stage.name, "stopped by user"));
                }
                return Ok(kind);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return handle
                    .exit_kind()
                    .ok_or_else(|| CxError::Channel("stage event channel closed".into()));
            }
        }
    }
}

fn finish_failed(events: &Sender<WorkflowEvent>, detail: String) -> WorkflowState {
    tracing::warn!("Workflow failed: {}", detail);
    let _ = events.send(WorkflowEvent::Finished {
        state: WorkflowState::Failed,
        detail,
    });
    WorkflowState::Failed
}

/// Handle to a workflow executing on a background thread
pub struct WorkflowRunner {
    events: Receiver<WorkflowEvent>,
    stop: Arc<AtomicBool>,
    worker: std::thread::JoinHandle<()>,
}

impl WorkflowRunner {
    /// Spawn a validated plan on a worker thread
    pub fn spawn(plan: WorkflowPlan) -> Self {
        let (tx, rx) = bounded(4096);
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();
        let worker = std::thread::spawn(move || {
            run_plan(&plan, &tx, &worker_stop);
        });
        Self {
            events: rx,
            stop,
            worker,
        }
    }

    /// Receive all pending events without blocking
    pub fn drain(&self) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Request the workflow stop; the stage in flight is terminated
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop the workflow and wait for the worker to wind down
    ///
    /// The worker owns the stage's [`crate::process::ProcessHandle`], so it
    /// must be joined before the application process exits or the stage
    /// child would be orphaned. The in-flight stage is torn down with the
    /// supervisor's bounded escalation, so the join completes promptly even
    /// against a child that ignores the graceful signal.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.worker.join().is_err() {
            tracing::warn!("Workflow worker panicked during shutdown");
        }
    }
}

/// Expected final artifact path for a request (display purposes)
pub fn final_artifact(working_dir: &Path, output_base: &str) -> PathBuf {
    working_dir.join(format!("{}{}", output_base.trim(), EXPORT_SUFFIX))
}
