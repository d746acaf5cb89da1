// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster tear-down: scale to zero, drain, unprotect, then stop the head
//! node's own services.
//!
//! Ordering matters end to end. Everything that can leave the cluster in a
//! recoverable half-scaled-down state runs first; the head node's own
//! services are only stopped once the worker side is fully released,
//! because past that point the next invocation cannot run.

use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::{Status, TerminationPolicy};
use cm_storage::{keys, StateStore};
use serde_json::json;
use tracing::{debug, error, info};

/// Execute the tear-down. The caller requests the head-node shutdown
/// afterwards, and only when this returns [`Status::Ok`].
pub async fn run<C: CloudPort, S: SchedulerPort>(
    cloud: &C,
    scheduler: &S,
    store: &mut StateStore,
) -> Status {
    let mut cloud_issue = false;
    let mut cluster_issue = false;

    let capacity = match cloud.cloud_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cloud capacities, aborting the tear-down");
            return Status::Cloud;
        }
    };

    if capacity.current_nodes > 0 {
        if capacity.minimum_nodes > 0 {
            // Remember the minimum so a restart can restore it; the platform
            // will not delete below the minimum otherwise.
            store.update_state(
                json!({ (keys::MIN_NODES_PRE_TERMINATION): capacity.minimum_nodes.to_string() }),
            );
            info!("setting the cluster minimum capacity to zero");
            if !cloud.set_min_nodes(0).await {
                debug!("failed to set the minimum number of nodes to zero");
                cloud_issue = true;
            }
        }

        info!("setting the desired capacity of the cluster to zero");
        if !cloud.set_cloud_capacity(0).await {
            debug!("failed to set the desired capacity to zero");
            cloud_issue = true;
        }

        info!("stopping workers on cluster nodes");
        let worker_nodes = scheduler.worker_nodes().await;
        if !worker_nodes.is_empty() {
            let nodes_stopped = scheduler.stop_workers_on_nodes(&worker_nodes).await;
            if !nodes_stopped.is_empty() {
                debug!(count = nodes_stopped.len(), "stopped workers on nodes");
                info!("unprotecting cluster nodes");
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
            if nodes_stopped != worker_nodes {
                let failed: Vec<_> = worker_nodes.difference(&nodes_stopped).collect();
                debug!(
                    count = failed.len(),
                    ?failed,
                    "failed to stop workers on nodes, skipping cluster termination"
                );
                cluster_issue = true;
            }
        }

        // Nodes that never registered with the scheduler (for instance ones
        // already flagged unhealthy) may still carry protection.
        if !cluster_issue && !cloud.unprotect_all_nodes().await {
            debug!("failed to unprotect all nodes in the scaling group");
            cloud_issue = true;
        }
    }

    if cloud_issue || cluster_issue {
        // Something went wrong scaling down; keep the head node's services
        // up so the next invocation can recover.
        return Status::from_issues(cloud_issue, cluster_issue);
    }

    debug!("stopping the job scheduler services");
    let job_manager_stopped = scheduler.stop_job_manager().await;
    let mjs_stopped = job_manager_stopped && scheduler.stop_mjs().await;
    if !mjs_stopped {
        debug!("failed to stop the scheduler on the head node, skipping head-node termination");
        cluster_issue = true;
    }

    // The status log holds stale idle timestamps; the scheduler recreates it.
    let log_path = store.config().mjs_status_log_file.clone();
    if log_path.exists() {
        debug!(path = %log_path.display(), "deleting the scheduler status log");
        if let Err(e) = std::fs::remove_file(&log_path) {
            debug!(path = %log_path.display(), error = %e, "failed to delete the status log");
        }
    }

    let initial_policy = TerminationPolicy::parse(&store.config().initial_termination_policy)
        .unwrap_or(TerminationPolicy::Never);
    debug!(policy = %initial_policy, "resetting the cluster termination policy to the initial choice");
    if !cloud.set_termination_policy(&initial_policy).await {
        debug!("failed to reset the cluster termination policy, skipping head-node deallocation");
        cloud_issue = true;
    }

    // A timestamp policy would be stale by the time the head node restarts.
    store.update_state(json!({ (keys::LAST_TERMINATION_POLICY): initial_policy.as_tag_value() }));

    if let Err(e) = store.flush() {
        error!(error = %e, "unable to update the cluster management data file, exiting");
        return Status::InternalIo;
    }

    Status::from_issues(cloud_issue, cluster_issue)
}

#[cfg(test)]
#[path = "teardown_tests.rs"]
mod tests;
