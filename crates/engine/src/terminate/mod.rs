// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination policy engine.
//!
//! Reads the `mw-autoshutdown` head-node tag, keeps a backup of it in the
//! state document, and dispatches to the on-idle or on-schedule policy.
//! After an auto-termination and reboot, the cluster is first restored to
//! its pre-termination shape.

mod on_idle;
mod on_schedule;

use cm_adapters::CloudPort;
use cm_core::{Clock, Status, TerminationPolicy};
use cm_storage::{keys, StateStore};
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Run the termination routine for this invocation.
pub async fn run<C: CloudPort, K: Clock>(
    cloud: &C,
    store: &mut StateStore,
    clock: &K,
) -> Status {
    if store.state().cluster_ready_for_termination {
        // Already marked; the tear-down will do the work.
        return Status::Ok;
    }

    if !reinitialize_after_auto_termination(cloud, store).await {
        return Status::Cloud;
    }

    info!("retrieving the autoshutdown tag from the head node");
    let tag = cloud.termination_policy().await;
    let policy = backup_policy(tag, cloud, store).await;
    debug!(policy = %policy, "resolved termination policy");

    match policy {
        TerminationPolicy::Never => {
            info!("no termination policy to be implemented");
            Status::Ok
        }
        TerminationPolicy::OnIdle => {
            info!("starting termination routine: terminate on idle");
            let status = on_idle::run(cloud, store, clock).await;
            info!(status = %status, "completed termination routine");
            status
        }
        TerminationPolicy::AfterHours(hours) => {
            info!("starting termination routine: terminate on schedule");
            let status =
                on_schedule::run(cloud, store, on_schedule::Schedule::AfterHours(hours), clock)
                    .await;
            info!(status = %status, "completed termination routine");
            status
        }
        TerminationPolicy::At(instant) => {
            info!("starting termination routine: terminate on schedule");
            let status =
                on_schedule::run(cloud, store, on_schedule::Schedule::At(instant), clock).await;
            info!(status = %status, "completed termination routine");
            status
        }
    }
}

/// Restore the cluster's shape on the first run after an auto-termination.
///
/// Returns false only when the restore could not even be attempted safely
/// (capacity unreadable or the desired-capacity write failed); min-nodes
/// restore failures are logged and tolerated.
async fn reinitialize_after_auto_termination<C: CloudPort>(
    cloud: &C,
    store: &mut StateStore,
) -> bool {
    let state = store.state();
    if !(state.first_run_after_reboot && state.cluster_auto_terminated) {
        return true;
    }

    // Tear-down zeroes the minimum so the platform could delete every node;
    // put the original minimum back first.
    let min_nodes = state.min_nodes_pre_termination_value();
    if min_nodes > 0 {
        debug!(min_nodes, "resetting minimum nodes to the pre-termination value");
        if !cloud.set_min_nodes(min_nodes).await {
            warn!("failed to restore the minimum node count");
        }
    }

    if store.config().autoscaling_enabled {
        // The autoscaler owns the desired capacity.
        return true;
    }

    let capacity = match cloud.cloud_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cloud capacities, exiting");
            return false;
        }
    };
    if capacity.current_nodes > 0 {
        return true;
    }

    let initial_desired_capacity = store.config().initial_desired_capacity;
    info!(
        initial_desired_capacity,
        "cluster was auto-terminated in the previous run, restoring the initial desired capacity"
    );
    if !cloud.set_cloud_capacity(initial_desired_capacity).await {
        error!(initial_desired_capacity, "failed to set the cloud capacity");
        return false;
    }
    info!(initial_desired_capacity, "successfully set the cloud capacity");
    store.update_state(json!({ (keys::CLUSTER_AUTO_TERMINATED): false }));
    true
}

/// Normalize the tag value and keep the state document's backup of it in
/// sync.
///
/// An empty or invalid tag is replaced by the last known policy (falling
/// back to the configured initial policy, then `never`) and pushed back to
/// the head node. A valid tag that differs from the backup replaces it.
async fn backup_policy<C: CloudPort>(
    tag: Option<TerminationPolicy>,
    cloud: &C,
    store: &mut StateStore,
) -> TerminationPolicy {
    match tag {
        None => {
            info!("the autoshutdown tag value is empty or invalid, resetting it to the last known value");
            let policy = TerminationPolicy::parse(&store.state().last_termination_policy)
                .or_else(|| TerminationPolicy::parse(&store.config().initial_termination_policy))
                .unwrap_or(TerminationPolicy::Never);
            if !cloud.set_termination_policy(&policy).await {
                error!(policy = %policy, "failed to update the autoshutdown tag");
            }
            policy
        }
        Some(policy) => {
            let canonical = policy.as_tag_value();
            if store.state().last_termination_policy != canonical {
                debug!(policy = %canonical, "backing up the termination policy");
                store.update_state(json!({ (keys::LAST_TERMINATION_POLICY): canonical }));
            }
            policy
        }
    }
}

#[cfg(test)]
#[path = "terminate_tests.rs"]
mod tests;
