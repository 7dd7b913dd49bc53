//! Process lifecycle management: spawn, stream output, terminate, reap
//!
//! The supervisor owns exactly one child process per [`ProcessHandle`]. Output
//! forwarding runs on dedicated threads so the UI thread only ever polls a
//! channel. Termination is graceful-then-forced: SIGTERM (on unix), a bounded
//! wait, then SIGKILL, so an uncooperative child can never hang the UI.

use crate::error::{CxError, Result};
use crate::process::ProcessEvent;
use crate::types::ExitKind;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Capacity of the per-process event channel
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// How long to wait for a graceful exit before escalating to a forced kill
const GRACEFUL_EXIT_WAIT: Duration = Duration::from_secs(1);

/// Poll interval for exit observation
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Description of an external command to supervise
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Path to the executable (or bare name resolved via PATH)
    pub program: PathBuf,
    /// Argument list, exactly as passed to the OS
    pub args: Vec<String>,
    /// Working directory for the child; inherited when `None`
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for a program with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Handle to one running supervised process
///
/// Dropping the handle force-kills the child if it is still running, so a
/// session can never leak a process holding an exclusive device.
pub struct ProcessHandle {
    program: String,
    pid: u32,
    events: Receiver<ProcessEvent>,
    child: Arc<Mutex<Child>>,
    exit: Arc<Mutex<Option<ExitKind>>>,
}

/// Spawn a supervised process
///
/// Fails with [`CxError::Launch`] if the program path names a missing file or
/// the OS refuses to spawn it. On success, output lines begin arriving on the
/// handle's event channel immediately.
pub fn spawn(spec: &CommandSpec) -> Result<ProcessHandle> {
    let program_display = spec.program.display().to_string();

    // A path with directory components must exist up front; bare names are
    // left to PATH resolution at spawn time.
    if spec.program.parent().is_some_and(|p| !p.as_os_str().is_empty()) && !spec.program.exists() {
        return Err(CxError::launch(&program_display, "executable not found"));
    }

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| CxError::launch(&program_display, e.to_string()))?;

    let pid = child.id();
    tracing::info!("Spawned {} (pid {})", program_display, pid);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    let child = Arc::new(Mutex::new(child));
    let exit = Arc::new(Mutex::new(None));

    let reaper_child = child.clone();
    let reaper_exit = exit.clone();
    let stderr_tx = tx.clone();
    let worker_program = program_display.clone();
    std::thread::spawn(move || {
        // stderr gets its own forwarder; stdout is read on this thread.
        let stderr_thread =
            stderr.map(|pipe| std::thread::spawn(move || forward_lines(pipe, stderr_tx)));
        if let Some(pipe) = stdout {
            forward_lines(pipe, tx.clone());
        }
        if let Some(handle) = stderr_thread {
            let _ = handle.join();
        }

        // Both pipes are at EOF; reap the child. try_wait keeps the mutex
        // hold short so terminate() can interleave.
        let kind = reap(&reaper_child);
        *lock(&reaper_exit) = Some(kind);
        tracing::debug!("{} finished: {}", worker_program, kind);
        let _ = tx.send(ProcessEvent::Exited(kind));
    });

    Ok(ProcessHandle {
        program: program_display,
        pid,
        events: rx,
        child,
        exit,
    })
}

impl ProcessHandle {
    /// Program path this handle supervises
    pub fn program(&self) -> &str {
        &self.program
    }

    /// OS process id of the child
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Event channel carrying output lines and the final exit event
    pub fn events(&self) -> &Receiver<ProcessEvent> {
        &self.events
    }

    /// Receive all pending events without blocking
    pub fn drain(&self) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Exit status, available once the output stream is exhausted and the
    /// child has been reaped
    pub fn exit_kind(&self) -> Option<ExitKind> {
        *lock(&self.exit)
    }

    /// Whether the child has been reaped
    pub fn is_finished(&self) -> bool {
        self.exit_kind().is_some()
    }

    /// Block until the child has been reaped or the timeout elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ExitKind> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(kind) = self.exit_kind() {
                return Some(kind);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(REAP_POLL_INTERVAL);
        }
    }

    /// Request termination: graceful signal first, forced kill if the child
    /// has not exited within a bounded wait
    ///
    /// Idempotent: calling on an already-exited process is a no-op.
    pub fn terminate(&self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }

        tracing::info!("Terminating {} (pid {})", self.program, self.pid);
        self.signal_graceful();

        let deadline = Instant::now() + GRACEFUL_EXIT_WAIT;
        while Instant::now() < deadline {
            if self.is_finished() {
                return Ok(());
            }
            std::thread::sleep(REAP_POLL_INTERVAL);
        }

        tracing::warn!(
            "{} (pid {}) ignored graceful termination, killing",
            self.program,
            self.pid
        );
        self.force_kill()
    }

    /// Request termination without blocking the caller
    ///
    /// Sends the graceful signal and returns immediately; a short-lived
    /// background thread escalates to a forced kill if the child is still
    /// running once the bounded wait elapses. For callers on the UI thread.
    /// Idempotent like [`ProcessHandle::terminate`].
    pub fn request_terminate(&self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }

        tracing::info!("Terminating {} (pid {})", self.program, self.pid);
        self.signal_graceful();

        let child = self.child.clone();
        let exit = self.exit.clone();
        let program = self.program.clone();
        let pid = self.pid;
        std::thread::spawn(move || {
            let deadline = Instant::now() + GRACEFUL_EXIT_WAIT;
            while Instant::now() < deadline {
                if lock(&exit).is_some() {
                    return;
                }
                std::thread::sleep(REAP_POLL_INTERVAL);
            }

            tracing::warn!("{} (pid {}) ignored graceful termination, killing", program, pid);
            if let Err(e) = lock(&child).kill() {
                // The reaper may have won the race.
                if lock(&exit).is_none() {
                    tracing::warn!("Failed to kill {} (pid {}): {}", program, pid, e);
                }
            }
        });
        Ok(())
    }

    /// Send the platform's graceful termination signal, if it has one
    fn signal_graceful(&self) {
        #[cfg(unix)]
        // SAFETY: kill with a valid pid and signal number has no memory
        // safety concerns; a stale pid at worst returns ESRCH.
        unsafe {
            libc::kill(self.pid as libc::pid_t, libc::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            // No graceful signal available; the bounded wait in terminate()
            // still applies before the forced kill.
        }
    }

    /// Forcibly kill the child
    fn force_kill(&self) -> Result<()> {
        match lock(&self.child).kill() {
            Ok(()) => Ok(()),
            // The reaper may have won the race between our check and the kill.
            Err(_) if self.is_finished() => Ok(()),
            Err(e) => Err(CxError::Io(e)),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.signal_graceful();
            let _ = lock(&self.child).kill();
        }
    }
}

/// Poll the child until it can be reaped
fn reap(child: &Arc<Mutex<Child>>) -> ExitKind {
    loop {
        match lock(child).try_wait() {
            Ok(Some(status)) => return ExitKind::from_status(status),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to reap child: {}", e);
                return ExitKind::Killed;
            }
        }
        std::thread::sleep(REAP_POLL_INTERVAL);
    }
}

/// Forward a pipe's content as decoded lines, splitting on `\r` and `\n`
///
/// FFmpeg rewrites its progress line with bare carriage returns, so both
/// separators must flush. Invalid UTF-8 is replaced, never fatal. Returns
/// when the pipe hits EOF or the receiver is gone.
fn forward_lines<R: Read>(mut pipe: R, tx: Sender<ProcessEvent>) {
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("Output pipe read failed: {}", e);
                break;
            }
        };

        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                if !pending.is_empty() {
                    let line = String::from_utf8_lossy(&pending).into_owned();
                    pending.clear();
                    if tx.send(ProcessEvent::Line(line)).is_err() {
                        return;
                    }
                }
            } else {
                pending.push(byte);
            }
        }
    }

    if !pending.is_empty() {
        let line = String::from_utf8_lossy(&pending).into_owned();
        let _ = tx.send(ProcessEvent::Line(line));
    }
}

/// Lock a mutex, recovering the guard if a panicked thread poisoned it
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("/usr/bin/ffmpeg")
            .arg("-hide_banner")
            .args(["-i", "/dev/cxadc0"])
            .working_dir("/tmp");

        assert_eq!(spec.program, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(spec.args, vec!["-hide_banner", "-i", "/dev/cxadc0"]);
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_spawn_missing_executable_is_launch_error() {
        let spec = CommandSpec::new("/nonexistent/path/to/tool");
        match spawn(&spec) {
            Err(CxError::Launch { program, .. }) => {
                assert!(program.contains("nonexistent"));
            }
            other => panic!("expected launch error, got {:?}", other.map(|h| h.pid())),
        }
    }

    #[test]
    fn test_forward_lines_splits_on_cr_and_lf() {
        let (tx, rx) = bounded(64);
        forward_lines("first\rsecond\nthird".as_bytes(), tx);

        let lines: Vec<String> = rx
            .try_iter()
            .map(|e| match e {
                ProcessEvent::Line(l) => l,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_forward_lines_skips_empty_segments() {
        let (tx, rx) = bounded(64);
        forward_lines("a\r\n\r\nb\n".as_bytes(), tx);

        let count = rx.try_iter().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_forward_lines_replaces_invalid_utf8() {
        let (tx, rx) = bounded(64);
        forward_lines(&b"bad\xff\xfebytes\n"[..], tx);

        match rx.try_recv() {
            Ok(ProcessEvent::Line(line)) => {
                assert!(line.starts_with("bad"));
                assert!(line.contains('\u{FFFD}'));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_collects_output_and_exit_code() {
        let spec = CommandSpec::new("/bin/sh")
            .args(["-c", "echo out; echo err 1>&2; exit 3"]);
        let handle = spawn(&spec).expect("spawn sh");

        let kind = handle
            .wait_timeout(Duration::from_secs(5))
            .expect("child should exit");
        assert_eq!(kind, ExitKind::Code(3));

        let lines: Vec<String> = handle
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ProcessEvent::Line(l) => Some(l),
                ProcessEvent::Exited(_) => None,
            })
            .collect();
        assert!(lines.contains(&"out".to_string()));
        assert!(lines.contains(&"err".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_is_idempotent() {
        let spec = CommandSpec::new("/bin/sleep").arg("30");
        let handle = spawn(&spec).expect("spawn sleep");

        handle.terminate().expect("first terminate");
        handle.terminate().expect("second terminate is a no-op");

        let kind = handle
            .wait_timeout(Duration::from_secs(5))
            .expect("terminated child should be reaped");
        assert!(!kind.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_request_terminate_returns_before_escalating() {
        // Masks SIGTERM; the forced kill must happen off the calling thread.
        let spec = CommandSpec::new("/bin/sh")
            .args(["-c", "trap '' TERM\nwhile :; do sleep 0.1; done"]);
        let handle = spawn(&spec).expect("spawn sh");
        std::thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        handle.request_terminate().expect("request terminate");
        assert!(started.elapsed() < GRACEFUL_EXIT_WAIT);

        let kind = handle
            .wait_timeout(Duration::from_secs(5))
            .expect("escalation reaps the child");
        assert_eq!(kind, ExitKind::Killed);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_event_is_last() {
        let spec = CommandSpec::new("/bin/sh").args(["-c", "echo one; echo two"]);
        let handle = spawn(&spec).expect("spawn sh");
        handle.wait_timeout(Duration::from_secs(5)).expect("exit");

        // The exit status is recorded just before the final event is sent, so
        // give the send a moment to land.
        let mut events = handle.drain();
        let deadline = Instant::now() + Duration::from_secs(2);
        while !matches!(events.last(), Some(ProcessEvent::Exited(_))) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            events.extend(handle.drain());
        }
        assert!(matches!(events.last(), Some(ProcessEvent::Exited(_))));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ProcessEvent::Line(_)))
                .count(),
            2
        );
    }
}
