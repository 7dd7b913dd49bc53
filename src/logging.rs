//! Tracing setup shared by the three binaries
//!
//! Console output honors `RUST_LOG`; a daily-rolling file in the app data
//! directory keeps a persistent record. The returned guard must stay alive
//! for the duration of `main` or buffered file output is lost.

use crate::config::ensure_app_data_dir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for a binary; `app` names the log file
pub fn init(app: &str) -> Option<WorkerGuard> {
    let file_layer = ensure_app_data_dir().ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, format!("{}.log", app));
        tracing_appender::non_blocking(appender)
    });

    let (file_writer_layer, guard) = match file_layer {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cxgui=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_writer_layer)
        .init();

    guard
}
