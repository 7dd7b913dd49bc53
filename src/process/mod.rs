//! External process supervision
//!
//! All three cxgui applications drive external tools (FFmpeg, mpv, decode,
//! tbc-video-export) the same way: spawn the tool, stream its combined
//! stdout/stderr into the UI line by line, and own its lifecycle until exit.
//! This module provides that supervision layer.
//!
//! # Architecture
//!
//! [`spawn`] starts the child with both output pipes captured and hands back
//! a [`ProcessHandle`]. A per-process worker thread (plus one helper thread
//! for stderr) forwards decoded lines over a bounded crossbeam channel and
//! reaps the child when the stream ends. The UI thread never blocks on the
//! child; it drains the event channel with `try_recv` each frame.
//!
//! Stream order is preserved per pipe end-to-end; the two pipes are
//! forwarded independently, so interleaving between stdout and stderr lines
//! is arbitrary. The final event on the channel is always
//! [`ProcessEvent::Exited`], sent only after both pipes reached EOF and the
//! exit status was observed.

pub mod supervisor;

pub use supervisor::{spawn, CommandSpec, ProcessHandle};

use crate::types::ExitKind;

/// Event delivered from a supervised process to its consumer
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// One decoded output line (split on `\r` and `\n`, lossy UTF-8)
    Line(String),
    /// The process exited; always the last event on the channel
    Exited(ExitKind),
}
