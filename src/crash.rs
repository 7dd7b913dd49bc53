//! Crash log for unrecoverable startup failures
//!
//! When window creation fails there is no interactive surface left to show
//! an error on, so the failure detail is appended to a plain-text file in
//! the app data directory instead. Best effort: if even that fails, the
//! detail only reaches the log stream.

use crate::config::ensure_app_data_dir;
use std::io::Write;

/// Crash log filename
pub const CRASH_LOG_FILE: &str = "crash.log";

/// Append a timestamped failure record to the crash log
pub fn write_crash_log(detail: &str) {
    let Ok(dir) = ensure_app_data_dir() else {
        tracing::error!("Startup failure (no crash log available): {}", detail);
        return;
    };
    let path = dir.join(CRASH_LOG_FILE);

    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| {
            writeln!(
                file,
                "[{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                detail
            )
        });

    match result {
        Ok(()) => tracing::error!("Startup failure recorded in {}", path.display()),
        Err(e) => tracing::error!("Startup failure ({}); crash log write failed: {}", detail, e),
    }
}
