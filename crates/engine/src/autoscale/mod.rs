// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autoscaling: capacity control, health check, scale-in protection.

mod capacity;
mod health;
mod scale_in;

use cm_adapters::{CloudPort, SchedulerPort};
use cm_core::Status;
use tracing::info;

/// Run the three autoscaling stages in order and report the worst outcome.
///
/// Capacity control aligns the scheduler's worker limits with the scaling
/// group, the health check flags degenerate nodes for replacement, and
/// scale-in protection releases idle nodes when the platform wants to
/// shrink.
pub async fn run<C: CloudPort, S: SchedulerPort>(cloud: &C, scheduler: &S) -> Status {
    info!("# starting capacity control");
    let capacity = capacity::run(cloud, scheduler).await;
    info!(status = %capacity, "# finished capacity control");

    info!("# starting health check");
    let health = health::run(cloud, scheduler).await;
    info!(status = %health, "# finished health check");

    info!("# starting scale-in protection");
    let scale_in = scale_in::run(cloud, scheduler).await;
    info!(status = %scale_in, "# finished scale-in protection");

    capacity.merge(health).merge(scale_in)
}
