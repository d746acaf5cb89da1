// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capacity control: keep the scheduler and the scaling group agreeing on
//! worker and node counts.

use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::{CloudCapacity, Status};
use tracing::{debug, error, info};

/// Align the scheduler's maximum workers with the group's maximum nodes,
/// and the group's desired nodes with the scheduler's desired workers.
pub(crate) async fn run<C: CloudPort, S: SchedulerPort>(cloud: &C, scheduler: &S) -> Status {
    let cloud_capacity = match cloud.cloud_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cloud capacities, exiting");
            return Status::Cloud;
        }
    };
    debug!(?cloud_capacity, "current cloud capacities");

    let cluster_capacity = match scheduler.cluster_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cluster capacities, exiting");
            return Status::Cluster;
        }
    };
    debug!(?cluster_capacity, "current cluster capacities");

    // The job manager's ceiling tracks what the group could grow to.
    let maximum_workers_requested = cloud_capacity.maximum_nodes * cloud_capacity.workers_per_node;
    debug!(
        nodes = cloud_capacity.maximum_nodes,
        workers = maximum_workers_requested,
        "maximum capacity"
    );
    let mut cluster_issue = false;
    if maximum_workers_requested != cluster_capacity.maximum_workers {
        if scheduler.set_cluster_capacity(maximum_workers_requested).await {
            info!("updated the cluster's maximum capacity");
        } else {
            info!("failed to update the cluster's maximum capacity");
            cluster_issue = true;
        }
    }

    let desired_nodes_requested =
        node_count_for_workers(cluster_capacity.desired_workers, &cloud_capacity);
    debug!(
        workers = cluster_capacity.desired_workers,
        nodes = desired_nodes_requested,
        "desired capacity"
    );
    let mut cloud_issue = false;
    // Also nudge the platform when desired already matches but the running
    // count has not converged; some providers no-op repeated identical
    // writes and need the reassessment.
    if desired_nodes_requested != cloud_capacity.desired_nodes
        || desired_nodes_requested != cloud_capacity.current_nodes
    {
        if cloud.set_cloud_capacity(desired_nodes_requested).await {
            info!("updated the cloud platform's desired capacity");
        } else {
            info!("failed to update the cloud platform's desired capacity");
            cloud_issue = true;
        }
    }

    Status::from_issues(cloud_issue, cluster_issue)
}

/// Lowest node count that can hold `workers`, clamped to the group limits.
/// The minimum bound wins if the platform transiently reports min > max.
fn node_count_for_workers(workers: u32, cloud: &CloudCapacity) -> u32 {
    let nodes = workers.div_ceil(cloud.workers_per_node.max(1));
    nodes.min(cloud.maximum_nodes).max(cloud.minimum_nodes)
}

#[cfg(test)]
#[path = "capacity_tests.rs"]
mod tests;
