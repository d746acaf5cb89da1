// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capacity snapshots of the cloud scaling group and the job scheduler.

/// Point-in-time limits of the cloud scaling group.
///
/// `current_nodes` counts instances that are healthy and either pending or
/// in service. The platform can transiently violate `minimum_nodes <=
/// desired_nodes <= maximum_nodes`; consumers must tolerate that and never
/// write a desired capacity outside the bounds themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloudCapacity {
    pub desired_nodes: u32,
    pub minimum_nodes: u32,
    pub maximum_nodes: u32,
    pub current_nodes: u32,
    /// Workers hosted per instance; fixed per deployment, at least 1.
    pub workers_per_node: u32,
}

/// Point-in-time worker limits of the job scheduler, filtered to the worker
/// OS family of the head node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterCapacity {
    /// Workers currently registered with the scheduler.
    pub current_workers: u32,
    pub desired_workers: u32,
    pub maximum_workers: u32,
}
