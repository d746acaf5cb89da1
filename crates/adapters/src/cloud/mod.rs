// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud scaling-group port and the AWS adapter behind it.

mod aws;
pub mod imds;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCloudPort;

pub use aws::{AwsCloudAdapter, CloudSetupError};

use async_trait::async_trait;
use cm_core::{CloudCapacity, MwState, TerminationPolicy};
use std::collections::HashSet;

/// Worker-node hostnames as the scaling group and the scheduler know them.
pub type HostSet = HashSet<String>;

/// Operations on the cloud scaling group and the head-node tags.
///
/// Failure detail stays at the adapter layer (logged there); callers only
/// see availability. Reads return `None` when the platform could not be
/// queried, writes return whether they took effect, and the protection call
/// reports the subset of hosts it succeeded for.
#[async_trait]
pub trait CloudPort: Send + Sync + 'static {
    /// Capacity snapshot of the scaling group.
    async fn cloud_capacity(&self) -> Option<CloudCapacity>;

    /// Worker idle timeout in seconds, driven by the scaling-group tag.
    ///
    /// A missing or invalid tag is reset to the default and the default is
    /// returned, so this read cannot fail.
    async fn idle_timeout_seconds(&self) -> u64;

    /// Hosts in a good state: in service, healthy, protected from scale-in,
    /// and past the launch grace period.
    async fn worker_nodes(&self) -> Option<HostSet>;

    /// Set the scaling group's desired capacity.
    async fn set_cloud_capacity(&self, desired_nodes: u32) -> bool;

    /// Set the scaling group's minimum capacity.
    async fn set_min_nodes(&self, nodes: u32) -> bool;

    /// Flag hosts as unhealthy so the platform replaces them.
    async fn set_nodes_unhealthy(&self, hosts: &HostSet) -> bool;

    /// Set or clear scale-in protection. Returns the hosts for which the
    /// update succeeded; batching under the provider's per-call id limit is
    /// the adapter's concern.
    async fn set_nodes_protection(&self, hosts: &HostSet, protect: bool) -> HostSet;

    /// Normalized termination policy from the head-node tag, or `None` when
    /// the tag is absent or invalid.
    async fn termination_policy(&self) -> Option<TerminationPolicy>;

    /// Write the termination policy tag on the head node.
    async fn set_termination_policy(&self, policy: &TerminationPolicy) -> bool;

    /// Write the readiness tag on the head node.
    async fn set_mw_state(&self, state: MwState) -> bool;

    /// Clear scale-in protection on every instance in the group, including
    /// ones never registered with the scheduler.
    async fn unprotect_all_nodes(&self) -> bool;
}
