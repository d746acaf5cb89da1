// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One invocation of the cluster management program.

use crate::{autoscale, mw_state, teardown, terminate};
use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::{Clock, Status};
use cm_storage::StateStore;
use tracing::{debug, error};

/// Run a full reconciliation pass and return the process exit code.
///
/// Sequence: readiness stamping, then (while autoscaling is enabled, the
/// cluster is not terminating, and the scheduler runs) the autoscaling
/// routines, then the termination policy engine, a state flush, and
/// finally the tear-down plus head-node shutdown once the cluster has been
/// marked ready for termination. The exit code is the worst status of the
/// routines that ran; a failed flush overrides everything with 4.
pub async fn run_invocation<C, S, K>(
    cloud: &C,
    scheduler: &S,
    store: &mut StateStore,
    clock: &K,
) -> i32
where
    C: CloudPort,
    S: SchedulerPort,
    K: Clock,
{
    let mw_status = mw_state::run(cloud, scheduler, store).await;

    let mut autoscaling_status = Status::Ok;
    if store.config().autoscaling_enabled
        && !store.state().cluster_ready_for_termination
        && scheduler.is_mjs_running().await
    {
        debug!("starting autoscaling routine");
        autoscaling_status = autoscale::run(cloud, scheduler).await;
        debug!("completed autoscaling routine");
    }

    let mut termination_status = Status::Ok;
    if store.config().autotermination_enabled {
        termination_status = terminate::run(cloud, store, clock).await;
    }

    if store.is_dirty() {
        if let Err(e) = store.flush() {
            error!(error = %e, "unable to update the cluster management data file, exiting");
            return Status::InternalIo.code();
        }
    }

    let mut teardown_status = Status::Ok;
    if store.state().cluster_ready_for_termination {
        debug!("cluster marked as ready for termination, starting cluster termination");
        teardown_status = teardown::run(cloud, scheduler, store).await;
        if teardown_status == Status::Ok {
            debug!("attempting to deallocate the head node");
            if !scheduler.shutdown_instance().await {
                debug!("failed to deallocate the head node");
            }
        }
    }

    mw_status
        .merge(autoscaling_status)
        .merge(termination_status)
        .merge(teardown_status)
        .code()
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
