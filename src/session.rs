//! Application session: configuration plus the set of live processes
//!
//! Each GUI binary owns exactly one [`Session`]. It carries the
//! [`AppConfig`] and every supervised [`ProcessHandle`] spawned during the
//! session, so shutdown can guarantee nothing is left holding a capture
//! device or an output file. Components receive the session by reference
//! instead of reaching for globals.

use crate::config::AppConfig;
use crate::error::Result;
use crate::process::{self, CommandSpec, ProcessHandle};

/// Key identifying a process within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcId(u64);

/// Owns the configuration record and all active process handles
pub struct Session {
    /// Mutable in-memory configuration, flushed on shutdown
    pub config: AppConfig,
    processes: Vec<(ProcId, ProcessHandle)>,
    next_id: u64,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            processes: Vec::new(),
            next_id: 0,
        }
    }

    /// Spawn a supervised process owned by this session
    pub fn spawn(&mut self, spec: &CommandSpec) -> Result<ProcId> {
        let handle = process::spawn(spec)?;
        let id = ProcId(self.next_id);
        self.next_id += 1;
        self.processes.push((id, handle));
        Ok(id)
    }

    /// Access a process handle by id
    pub fn process(&self, id: ProcId) -> Option<&ProcessHandle> {
        self.processes
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, handle)| handle)
    }

    /// Request termination of a process without blocking
    ///
    /// Escalation to a forced kill happens on a background thread, so this
    /// is safe to call from the UI thread. The handle stays tracked so
    /// remaining output can be drained. Unknown ids are a no-op.
    pub fn terminate(&self, id: ProcId) -> Result<()> {
        match self.process(id) {
            Some(handle) => handle.request_terminate(),
            None => Ok(()),
        }
    }

    /// Drop a process handle, force-killing the child if still running
    pub fn release(&mut self, id: ProcId) {
        self.processes.retain(|(pid, _)| *pid != id);
    }

    /// Number of tracked processes
    pub fn active_count(&self) -> usize {
        self.processes.len()
    }

    /// Terminate every live process
    ///
    /// Called from the frontend's exit hook, before the configuration is
    /// flushed. Termination failures are logged; the attempt is made exactly
    /// once per process, and dropping the handles afterwards force-kills
    /// anything that survived.
    pub fn shutdown(&mut self) {
        for (id, handle) in &self.processes {
            if let Err(e) = handle.terminate() {
                tracing::warn!("Failed to terminate {} ({:?}): {}", handle.program(), id, e);
            }
        }
        self.processes.clear();
    }
}
