// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminate-on-idle policy: mark the cluster for termination once the
//! scheduler has been idle past the timeout.

use chrono::{DateTime, NaiveDateTime, Utc};
use cm_adapters::CloudPort;
use cm_core::consts::{MJS_BUSY_MARKER, UNUSED_CLUSTER_TIMEOUT_SECONDS};
use cm_core::{Clock, Status};
use cm_storage::{keys, StateStore};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

/// Check the last line of the scheduler status log and mark the cluster
/// ready for termination when it has been idle past the effective timeout.
pub(crate) async fn run<C: CloudPort, K: Clock>(
    cloud: &C,
    store: &mut StateStore,
    clock: &K,
) -> Status {
    let mut idle_timeout_seconds = cloud.idle_timeout_seconds().await;
    if !store.state().was_mjs_busy {
        // Leave a freshly built cluster enough time to accept its first job.
        idle_timeout_seconds = idle_timeout_seconds.max(UNUSED_CLUSTER_TIMEOUT_SECONDS);
    }

    let log_path = store.config().mjs_status_log_file.clone();
    let last_recorded_state = match read_last_line(&log_path) {
        Some(line) => line,
        None => {
            debug!(
                path = %log_path.display(),
                "cannot read the status log, skipping cluster termination as the scheduler state is not known"
            );
            return Status::Cluster;
        }
    };

    if last_recorded_state.contains(MJS_BUSY_MARKER) {
        info!("> scheduler is busy, skipping cluster termination");
        return Status::Ok;
    }

    let idle_since = match parse_idle_since(&last_recorded_state) {
        Some(instant) => instant,
        None => {
            warn!(line = %last_recorded_state, "unrecognized scheduler status line");
            return Status::Cluster;
        }
    };

    let idle_seconds = (clock.now_utc() - idle_since).num_seconds();
    info!(idle_seconds, idle_timeout_seconds, "> scheduler idle time");

    if idle_seconds > idle_timeout_seconds as i64 {
        info!("> idle for more than the timeout, marking the cluster as ready for termination");
        store.update_state(json!({
            (keys::CLUSTER_READY_FOR_TERMINATION): true,
            (keys::CLUSTER_AUTO_TERMINATED): true,
        }));
    } else {
        info!("> idle for less than the timeout, skipping cluster termination");
    }
    Status::Ok
}

/// Last non-empty line of the log, or `None` when the file is missing,
/// unreadable, or empty.
fn read_last_line(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().rev().find(|line| !line.trim().is_empty()).map(str::to_string)
}

/// Parse the timestamp out of an `MJS idle since: <stamp> UTC` line.
fn parse_idle_since(line: &str) -> Option<DateTime<Utc>> {
    let rest = line.split("since: ").nth(1)?;
    let stamp = rest.split(" UTC").next()?;
    NaiveDateTime::parse_from_str(stamp.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "on_idle_tests.rs"]
mod tests;
