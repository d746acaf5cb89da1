// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-scheduler port and the MJS CLI adapter behind it.

mod mjs;
mod output;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSchedulerPort;

pub use mjs::{MjsAdapter, WorkerOs};

use crate::cloud::HostSet;
use async_trait::async_trait;
use cm_core::ClusterCapacity;
use std::collections::HashMap;

/// Operations on the MATLAB Job Scheduler running on the head node.
///
/// Same failure conventions as [`CloudPort`](crate::CloudPort): reads return
/// `None` when the scheduler could not be queried, writes return whether
/// they took effect, and bulk drains report the subset that succeeded.
#[async_trait]
pub trait SchedulerPort: Send + Sync + 'static {
    /// Worker limits of the job manager, filtered to the head node's worker
    /// OS family.
    async fn cluster_capacity(&self) -> Option<ClusterCapacity>;

    /// Idle seconds per host. A host's figure is the minimum over its
    /// workers, so a host only counts as idle when all of its workers are.
    /// Empty when the scheduler could not be queried.
    async fn nodes_idle_seconds(&self) -> HashMap<String, u64>;

    /// Hosts registered with the scheduler but absent from `known_good`
    /// whose worker group reports the `Suspended` state. `None` when the
    /// registered set could not be read.
    async fn suspended_nodes(&self, known_good: &HostSet) -> Option<HostSet>;

    /// Hosts with at least one registered worker. Empty when the scheduler
    /// could not be queried.
    async fn worker_nodes(&self) -> HostSet;

    /// Set the job manager's maximum worker count.
    async fn set_cluster_capacity(&self, maximum_workers: u32) -> bool;

    /// Drain workers on the given hosts (only-if-idle semantics). Returns
    /// the hosts whose workers stopped and are no longer registered.
    async fn stop_workers_on_nodes(&self, hosts: &HostSet) -> HostSet;

    /// Stop every worker on this host.
    async fn stop_workers_locally(&self) -> bool;

    /// Whether the MJS service is running on this host.
    async fn is_mjs_running(&self) -> bool;

    /// Whether a job manager is running on this host.
    async fn is_job_manager_running(&self) -> bool;

    /// Stop the MJS service, preserving jobs.
    async fn stop_mjs(&self) -> bool;

    /// Stop the job manager, preserving jobs.
    async fn stop_job_manager(&self) -> bool;

    /// Gracefully shut down this host.
    async fn shutdown_instance(&self) -> bool;
}
