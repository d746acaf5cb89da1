// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminate-on-schedule policy: mark the cluster for termination once a
//! scheduled instant has passed.

use chrono::{DateTime, Duration, Utc};
use cm_adapters::CloudPort;
use cm_core::{Clock, Status, TerminationPolicy};
use cm_storage::{keys, StateStore};
use serde_json::json;
use tracing::{error, info};

/// Schedule form resolved from the policy tag.
pub(crate) enum Schedule {
    /// `After N hours`: the deadline is computed now and written back to the
    /// tag as a timestamp, so later invocations compare against a fixed
    /// instant.
    AfterHours(u8),
    /// A fixed instant from an earlier `After N hours` stamp or set by the
    /// user directly.
    At(DateTime<Utc>),
}

pub(crate) async fn run<C: CloudPort, K: Clock>(
    cloud: &C,
    store: &mut StateStore,
    schedule: Schedule,
    clock: &K,
) -> Status {
    let now = clock.now_utc();
    let deadline = match schedule {
        Schedule::AfterHours(hours) => {
            let deadline = now + Duration::hours(hours as i64);
            let stamped = TerminationPolicy::At(deadline);
            if !cloud.set_termination_policy(&stamped).await {
                error!("failed to update the cluster termination policy tag on the head node");
                return Status::Cloud;
            }
            deadline
        }
        Schedule::At(instant) => instant,
    };

    if now > deadline {
        info!("autoshutdown schedule reached, marking the cluster as ready for termination");
        store.update_state(json!({
            (keys::CLUSTER_READY_FOR_TERMINATION): true,
            (keys::CLUSTER_AUTO_TERMINATED): true,
        }));
    } else {
        let minutes_left = (deadline - now).num_minutes();
        info!(minutes_left, "autoshutdown schedule not reached, exiting");
    }
    Status::Ok
}

#[cfg(test)]
#[path = "on_schedule_tests.rs"]
mod tests;
