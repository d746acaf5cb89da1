// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scale-in protection: release idle nodes when the platform wants to
//! shrink.

use cm_adapters::{CloudPort, HostSet, SchedulerPort};
use cm_core::Status;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// When the group runs more nodes than desired, drain up to the difference
/// from the longest-idle nodes and remove their scale-in protection so the
/// platform can terminate them.
pub(crate) async fn run<C: CloudPort, S: SchedulerPort>(cloud: &C, scheduler: &S) -> Status {
    let capacity = match cloud.cloud_capacity().await {
        Some(capacity) => capacity,
        None => {
            tracing::error!("there was an issue retrieving cloud capacities, exiting");
            return Status::Cloud;
        }
    };
    debug!(?capacity, "current cloud capacities");

    let node_difference = match capacity.current_nodes.cmp(&capacity.desired_nodes) {
        Ordering::Equal => {
            info!("(=) the desired capacity matches the current capacity");
            return Status::Ok;
        }
        Ordering::Greater => capacity.current_nodes - capacity.desired_nodes,
        Ordering::Less => {
            info!("(>) the desired capacity is higher than the current capacity");
            return Status::Ok;
        }
    };
    info!(
        node_difference,
        "(<) the desired capacity is lower than the current capacity"
    );

    let idle_timeout_seconds = cloud.idle_timeout_seconds().await;
    debug!(idle_timeout_seconds, "idle timeout");

    let nodes_seconds_idle = scheduler.nodes_idle_seconds().await;
    let nodes_to_stop = pick_idle_nodes(&nodes_seconds_idle, idle_timeout_seconds, node_difference);
    if nodes_to_stop.is_empty() {
        info!("no nodes to stop");
        return Status::Ok;
    }

    let mut cluster_issue = false;
    let nodes_stopped = scheduler.stop_workers_on_nodes(&nodes_to_stop).await;
    if nodes_stopped != nodes_to_stop {
        let failed: Vec<_> = nodes_to_stop.difference(&nodes_stopped).collect();
        debug!(count = failed.len(), ?failed, "failed to stop workers on nodes");
        cluster_issue = true;
    }

    let mut cloud_issue = false;
    if !nodes_stopped.is_empty() {
        debug!(count = nodes_stopped.len(), "stopped workers on nodes");
        let nodes_unprotected = cloud.set_nodes_protection(&nodes_stopped, false).await;
        if nodes_unprotected != nodes_stopped {
            let failed: Vec<_> = nodes_stopped.difference(&nodes_unprotected).collect();
            debug!(count = failed.len(), ?failed, "failed to unprotect nodes");
            cloud_issue = true;
        }
        if !nodes_unprotected.is_empty() {
            debug!(count = nodes_unprotected.len(), "unprotected nodes");
        }
    }

    Status::from_issues(cloud_issue, cluster_issue)
}

/// Pick up to `wanted` hosts idle strictly longer than the timeout,
/// longest-idle first. Equal-to-timeout is not idle enough.
fn pick_idle_nodes(
    nodes_seconds_idle: &HashMap<String, u64>,
    idle_timeout_seconds: u64,
    wanted: u32,
) -> HostSet {
    let mut idle: Vec<(&String, u64)> = nodes_seconds_idle
        .iter()
        .map(|(host, seconds)| (host, *seconds))
        .collect();
    idle.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut picked = HostSet::new();
    for (host, seconds_idle) in idle {
        debug!(host = %host, seconds_idle, "considering node for scale-in");
        if seconds_idle > idle_timeout_seconds {
            debug!("  picked for scale-in");
            picked.insert(host.clone());
            if picked.len() >= wanted as usize {
                break;
            }
        } else {
            debug!("  skipped, not idle for long enough");
        }
    }
    picked
}

#[cfg(test)]
#[path = "scale_in_tests.rs"]
mod tests;
