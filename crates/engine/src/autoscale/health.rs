// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health check: flag nodes with suspended worker groups so the platform
//! replaces them.

use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::Status;
use tracing::{debug, error, info};

/// Probe nodes the scheduler knows about but the cloud does not consider
/// good, and flag the suspended ones as unhealthy.
///
/// The cloud-good set excludes freshly launched nodes (launch grace
/// period), so a node that merely has not registered yet is never flagged.
pub(crate) async fn run<C: CloudPort, S: SchedulerPort>(cloud: &C, scheduler: &S) -> Status {
    let good_nodes = match cloud.worker_nodes().await {
        Some(nodes) => nodes,
        None => {
            error!("there was an issue retrieving the worker nodes");
            return Status::Cloud;
        }
    };
    debug!(?good_nodes, "current nodes in a good state");

    let bad_nodes = match scheduler.suspended_nodes(&good_nodes).await {
        Some(nodes) => nodes,
        None => {
            error!("there was an issue querying the worker nodes");
            return Status::Cluster;
        }
    };

    if bad_nodes.is_empty() {
        info!("all nodes are healthy");
        return Status::Ok;
    }

    debug!(?bad_nodes, "marking nodes as unhealthy");
    if cloud.set_nodes_unhealthy(&bad_nodes).await {
        info!("successfully marked nodes as unhealthy");
        Status::Ok
    } else {
        info!("failed to set nodes as unhealthy");
        Status::Cloud
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
