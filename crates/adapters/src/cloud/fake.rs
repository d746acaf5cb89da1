// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable cloud port for tests.

use super::{CloudPort, HostSet};
use async_trait::async_trait;
use cm_core::consts::IDLE_TIMEOUT_DEFAULT_MINUTES;
use cm_core::{CloudCapacity, MwState, TerminationPolicy};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct FakeCloudState {
    capacity: Option<CloudCapacity>,
    idle_timeout_seconds: Option<u64>,
    worker_nodes: Option<HostSet>,
    termination_policy: Option<TerminationPolicy>,

    fail_set_capacity: bool,
    fail_set_min_nodes: bool,
    fail_set_unhealthy: bool,
    fail_set_policy: bool,
    fail_set_mw_state: bool,
    fail_unprotect_all: bool,
    /// Hosts whose protection updates are scripted to fail.
    protection_failures: HostSet,

    desired_capacity_calls: Vec<u32>,
    min_nodes_calls: Vec<u32>,
    unhealthy_calls: Vec<HostSet>,
    protection_calls: Vec<(HostSet, bool)>,
    policy_writes: Vec<TerminationPolicy>,
    mw_state_writes: Vec<MwState>,
    unprotect_all_calls: u32,
}

/// Fake cloud port with scripted responses and recorded calls
#[derive(Clone, Default)]
pub struct FakeCloudPort {
    inner: Arc<Mutex<FakeCloudState>>,
}

impl FakeCloudPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(self, capacity: CloudCapacity) -> Self {
        self.inner.lock().capacity = Some(capacity);
        self
    }

    pub fn with_idle_timeout_seconds(self, seconds: u64) -> Self {
        self.inner.lock().idle_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_worker_nodes(self, hosts: impl IntoIterator<Item = &'static str>) -> Self {
        self.inner.lock().worker_nodes =
            Some(hosts.into_iter().map(str::to_string).collect());
        self
    }

    pub fn with_termination_policy(self, policy: TerminationPolicy) -> Self {
        self.inner.lock().termination_policy = Some(policy);
        self
    }

    pub fn failing_set_capacity(self) -> Self {
        self.inner.lock().fail_set_capacity = true;
        self
    }

    pub fn failing_set_min_nodes(self) -> Self {
        self.inner.lock().fail_set_min_nodes = true;
        self
    }

    pub fn failing_set_unhealthy(self) -> Self {
        self.inner.lock().fail_set_unhealthy = true;
        self
    }

    pub fn failing_set_policy(self) -> Self {
        self.inner.lock().fail_set_policy = true;
        self
    }

    pub fn failing_set_mw_state(self) -> Self {
        self.inner.lock().fail_set_mw_state = true;
        self
    }

    pub fn failing_unprotect_all(self) -> Self {
        self.inner.lock().fail_unprotect_all = true;
        self
    }

    pub fn failing_protection_for(self, hosts: impl IntoIterator<Item = &'static str>) -> Self {
        self.inner.lock().protection_failures =
            hosts.into_iter().map(str::to_string).collect();
        self
    }

    pub fn desired_capacity_calls(&self) -> Vec<u32> {
        self.inner.lock().desired_capacity_calls.clone()
    }

    pub fn min_nodes_calls(&self) -> Vec<u32> {
        self.inner.lock().min_nodes_calls.clone()
    }

    pub fn unhealthy_calls(&self) -> Vec<HostSet> {
        self.inner.lock().unhealthy_calls.clone()
    }

    pub fn protection_calls(&self) -> Vec<(HostSet, bool)> {
        self.inner.lock().protection_calls.clone()
    }

    /// Hosts whose scale-in protection was removed, across all calls.
    pub fn unprotected_hosts(&self) -> HostSet {
        let inner = self.inner.lock();
        inner
            .protection_calls
            .iter()
            .filter(|(_, protect)| !protect)
            .flat_map(|(hosts, _)| hosts.iter().cloned())
            .filter(|h| !inner.protection_failures.contains(h))
            .collect()
    }

    pub fn policy_writes(&self) -> Vec<TerminationPolicy> {
        self.inner.lock().policy_writes.clone()
    }

    pub fn mw_state_writes(&self) -> Vec<MwState> {
        self.inner.lock().mw_state_writes.clone()
    }

    pub fn unprotect_all_calls(&self) -> u32 {
        self.inner.lock().unprotect_all_calls
    }
}

#[async_trait]
impl CloudPort for FakeCloudPort {
    async fn cloud_capacity(&self) -> Option<CloudCapacity> {
        self.inner.lock().capacity
    }

    async fn idle_timeout_seconds(&self) -> u64 {
        self.inner
            .lock()
            .idle_timeout_seconds
            .unwrap_or(IDLE_TIMEOUT_DEFAULT_MINUTES * 60)
    }

    async fn worker_nodes(&self) -> Option<HostSet> {
        self.inner.lock().worker_nodes.clone()
    }

    async fn set_cloud_capacity(&self, desired_nodes: u32) -> bool {
        let mut inner = self.inner.lock();
        inner.desired_capacity_calls.push(desired_nodes);
        !inner.fail_set_capacity
    }

    async fn set_min_nodes(&self, nodes: u32) -> bool {
        let mut inner = self.inner.lock();
        inner.min_nodes_calls.push(nodes);
        !inner.fail_set_min_nodes
    }

    async fn set_nodes_unhealthy(&self, hosts: &HostSet) -> bool {
        let mut inner = self.inner.lock();
        inner.unhealthy_calls.push(hosts.clone());
        !inner.fail_set_unhealthy
    }

    async fn set_nodes_protection(&self, hosts: &HostSet, protect: bool) -> HostSet {
        let mut inner = self.inner.lock();
        inner.protection_calls.push((hosts.clone(), protect));
        hosts
            .difference(&inner.protection_failures)
            .cloned()
            .collect()
    }

    async fn termination_policy(&self) -> Option<TerminationPolicy> {
        self.inner.lock().termination_policy
    }

    async fn set_termination_policy(&self, policy: &TerminationPolicy) -> bool {
        let mut inner = self.inner.lock();
        inner.policy_writes.push(*policy);
        !inner.fail_set_policy
    }

    async fn set_mw_state(&self, state: MwState) -> bool {
        let mut inner = self.inner.lock();
        inner.mw_state_writes.push(state);
        !inner.fail_set_mw_state
    }

    async fn unprotect_all_nodes(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.unprotect_all_calls += 1;
        !inner.fail_unprotect_all
    }
}
