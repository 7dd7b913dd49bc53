//! # cxgui: GUI suite for CXADC RF capture cards
//!
//! Three small desktop applications for operating CXADC capture hardware and
//! orchestrating the surrounding decode pipeline. None of them processes
//! video themselves: FFmpeg, mpv, the decode tool and tbc-video-export are
//! opaque collaborators reached through process invocation and their textual
//! output.
//!
//! ## Architecture
//!
//! - **Process supervision** ([`process`]): spawn an external tool, stream
//!   its combined output line by line over a crossbeam channel, terminate
//!   gracefully with a forced-kill fallback
//! - **Signal monitoring** ([`signal`], [`probe`]): probe `/dev/cxadcN`
//!   devices and classify signal presence from FFmpeg's `signalstats` YMIN
//!   statistic
//! - **Workflow sequencing** ([`workflow`]): decode then export, with the
//!   export stage gated on the decode exit code and overall success gated on
//!   the final artifact existing on disk
//! - **Frontend** ([`frontend`]): eframe/egui apps that drain worker events
//!   on the UI thread; workers never mutate UI state
//!
//! ## Configuration
//!
//! A flat JSON record (tool paths, last input, window geometry) lives in the
//! platform data directory under `org.cxgui`; see [`config`].

pub mod capture;
pub mod config;
pub mod crash;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod probe;
pub mod process;
pub mod session;
pub mod signal;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{CxError, Result};
pub use process::{CommandSpec, ProcessEvent, ProcessHandle};
pub use session::Session;
pub use types::{DeviceId, ExitKind, SignalSample, SIGNAL_THRESHOLD};
pub use workflow::{WorkflowRequest, WorkflowState};
