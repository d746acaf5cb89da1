// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster readiness: stamp the `mw-state` head-node tag.
//!
//! The cluster is ready to receive jobs once the job manager runs and, when
//! the scaling group wants nodes, at least one worker has registered. Each
//! invocation is one readiness attempt; after the persisted attempt counter
//! passes its bound the tag is stamped `timeout` instead and the routine
//! goes quiet.

use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::consts::MW_STATE_MAX_ATTEMPTS;
use cm_core::{MwState, Status};
use cm_storage::{keys, StateStore};
use serde_json::json;
use tracing::{error, info};

/// Evaluate cluster readiness and set the `mw-state` tag.
///
/// A failed tag write leaves `mw_state_set` unset so the next invocation
/// retries.
pub async fn run<C: CloudPort, S: SchedulerPort>(
    cloud: &C,
    scheduler: &S,
    store: &mut StateStore,
) -> Status {
    if store.state().mw_state_set {
        info!("cluster status already set, exiting");
        return Status::Ok;
    }

    let attempts = store.state().mw_state_counter_value();
    if attempts > MW_STATE_MAX_ATTEMPTS {
        info!("timeout reached while determining cluster status");
        if !cloud.set_mw_state(MwState::Timeout).await {
            error!("failed to set the mw-state tag to 'timeout'");
            return Status::Cloud;
        }
        store.update_state(json!({ (keys::MW_STATE_SET): true }));
        return Status::Ok;
    }

    store.update_state(json!({ (keys::MW_STATE_COUNTER): (attempts + 1).to_string() }));

    if !scheduler.is_job_manager_running().await {
        info!("job manager is not running, will re-check in the next invocation");
        return Status::Cluster;
    }

    let cloud_capacity = match cloud.cloud_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cloud capacities, exiting");
            return Status::Cloud;
        }
    };

    // A cluster that wants no nodes is ready as soon as its job manager is.
    if cloud_capacity.desired_nodes == 0 {
        return stamp_ready(cloud, store).await;
    }

    let cluster_capacity = match scheduler.cluster_capacity().await {
        Some(capacity) => capacity,
        None => {
            error!("there was an issue retrieving cluster capacities, exiting");
            return Status::Cluster;
        }
    };

    if cluster_capacity.current_workers > 0 {
        info!("found a worker registered with the scheduler, setting mw-state as ready");
        stamp_ready(cloud, store).await
    } else {
        info!(
            desired_nodes = cloud_capacity.desired_nodes,
            "no workers registered yet, will re-check in the next invocation"
        );
        Status::Ok
    }
}

async fn stamp_ready<C: CloudPort>(cloud: &C, store: &mut StateStore) -> Status {
    if !cloud.set_mw_state(MwState::Ready).await {
        error!("failed to set the mw-state tag to 'ready'");
        return Status::Cloud;
    }
    store.update_state(json!({ (keys::MW_STATE_SET): true }));
    Status::Ok
}

#[cfg(test)]
#[path = "mw_state_tests.rs"]
mod tests;
