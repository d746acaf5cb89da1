// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File logging setup shared by both binaries.
//!
//! Logs go to a daily-rolling file under the log directory (next to the
//! executable by default, `CM_LOG_DIR` overrides) and to stderr. The filter
//! is read from `CM_LOG`, defaulting to `info`.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. The returned guard must stay alive for
/// the duration of the program, or buffered log lines are lost.
pub fn init(program: &str) -> WorkerGuard {
    let dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("warning: cannot create log directory {}: {e}", dir.display());
    }
    let file = tracing_appender::rolling::daily(dir, format!("{program}.log"));
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_env("CM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    guard
}

fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CM_LOG_DIR") {
        return PathBuf::from(dir);
    }
    crate::paths::exe_dir().join("logs")
}
