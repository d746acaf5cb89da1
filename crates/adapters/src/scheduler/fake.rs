// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable scheduler port for tests.

use super::SchedulerPort;
use crate::cloud::HostSet;
use async_trait::async_trait;
use cm_core::ClusterCapacity;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct FakeSchedulerState {
    cluster_capacity: Option<ClusterCapacity>,
    idle_seconds: HashMap<String, u64>,
    suspended: HostSet,
    registered: HostSet,
    mjs_running: bool,
    job_manager_running: bool,

    fail_set_capacity: bool,
    fail_suspended: bool,
    fail_stop_local: bool,
    fail_stop_mjs: bool,
    fail_stop_job_manager: bool,
    fail_shutdown: bool,
    /// Hosts whose drains are scripted to fail.
    stop_failures: HostSet,

    set_capacity_calls: Vec<u32>,
    stop_calls: Vec<HostSet>,
    suspended_queries: Vec<HostSet>,
    stop_local_calls: u32,
    /// Ordered record of lifecycle operations, for sequencing assertions.
    op_log: Vec<&'static str>,
}

/// Fake scheduler port with scripted responses and recorded calls
#[derive(Clone, Default)]
pub struct FakeSchedulerPort {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl FakeSchedulerPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_capacity(self, capacity: ClusterCapacity) -> Self {
        self.inner.lock().cluster_capacity = Some(capacity);
        self
    }

    pub fn with_idle_seconds(
        self,
        idle: impl IntoIterator<Item = (&'static str, u64)>,
    ) -> Self {
        self.inner.lock().idle_seconds =
            idle.into_iter().map(|(h, s)| (h.to_string(), s)).collect();
        self
    }

    pub fn with_suspended_nodes(self, hosts: impl IntoIterator<Item = &'static str>) -> Self {
        self.inner.lock().suspended = hosts.into_iter().map(str::to_string).collect();
        self
    }

    /// Script `suspended_nodes` to fail (`None`).
    pub fn failing_suspended_nodes(self) -> Self {
        self.inner.lock().fail_suspended = true;
        self
    }

    pub fn with_registered_nodes(self, hosts: impl IntoIterator<Item = &'static str>) -> Self {
        self.inner.lock().registered = hosts.into_iter().map(str::to_string).collect();
        self
    }

    pub fn running(self) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.mjs_running = true;
            inner.job_manager_running = true;
        }
        self
    }

    pub fn with_job_manager_running(self, running: bool) -> Self {
        self.inner.lock().job_manager_running = running;
        self
    }

    pub fn failing_set_capacity(self) -> Self {
        self.inner.lock().fail_set_capacity = true;
        self
    }

    pub fn failing_stop_for(self, hosts: impl IntoIterator<Item = &'static str>) -> Self {
        self.inner.lock().stop_failures = hosts.into_iter().map(str::to_string).collect();
        self
    }

    pub fn failing_stop_locally(self) -> Self {
        self.inner.lock().fail_stop_local = true;
        self
    }

    pub fn failing_stop_mjs(self) -> Self {
        self.inner.lock().fail_stop_mjs = true;
        self
    }

    pub fn failing_stop_job_manager(self) -> Self {
        self.inner.lock().fail_stop_job_manager = true;
        self
    }

    pub fn failing_shutdown(self) -> Self {
        self.inner.lock().fail_shutdown = true;
        self
    }

    pub fn set_capacity_calls(&self) -> Vec<u32> {
        self.inner.lock().set_capacity_calls.clone()
    }

    pub fn stop_calls(&self) -> Vec<HostSet> {
        self.inner.lock().stop_calls.clone()
    }

    /// Hosts drained across all calls, minus the scripted failures.
    pub fn drained_hosts(&self) -> HostSet {
        let inner = self.inner.lock();
        inner
            .stop_calls
            .iter()
            .flat_map(|hosts| hosts.iter().cloned())
            .filter(|h| !inner.stop_failures.contains(h))
            .collect()
    }

    pub fn suspended_queries(&self) -> Vec<HostSet> {
        self.inner.lock().suspended_queries.clone()
    }

    pub fn stop_local_calls(&self) -> u32 {
        self.inner.lock().stop_local_calls
    }

    /// Lifecycle operations in invocation order.
    pub fn op_log(&self) -> Vec<&'static str> {
        self.inner.lock().op_log.clone()
    }

    pub fn stop_mjs_calls(&self) -> usize {
        self.inner.lock().op_log.iter().filter(|op| **op == "stop_mjs").count()
    }

    pub fn stop_job_manager_calls(&self) -> usize {
        self.inner
            .lock()
            .op_log
            .iter()
            .filter(|op| **op == "stop_job_manager")
            .count()
    }

    pub fn shutdown_calls(&self) -> usize {
        self.inner.lock().op_log.iter().filter(|op| **op == "shutdown").count()
    }
}

#[async_trait]
impl SchedulerPort for FakeSchedulerPort {
    async fn cluster_capacity(&self) -> Option<ClusterCapacity> {
        self.inner.lock().cluster_capacity
    }

    async fn nodes_idle_seconds(&self) -> HashMap<String, u64> {
        self.inner.lock().idle_seconds.clone()
    }

    async fn suspended_nodes(&self, known_good: &HostSet) -> Option<HostSet> {
        let mut inner = self.inner.lock();
        inner.suspended_queries.push(known_good.clone());
        if inner.fail_suspended {
            return None;
        }
        Some(inner.suspended.clone())
    }

    async fn worker_nodes(&self) -> HostSet {
        self.inner.lock().registered.clone()
    }

    async fn set_cluster_capacity(&self, maximum_workers: u32) -> bool {
        let mut inner = self.inner.lock();
        inner.set_capacity_calls.push(maximum_workers);
        !inner.fail_set_capacity
    }

    async fn stop_workers_on_nodes(&self, hosts: &HostSet) -> HostSet {
        let mut inner = self.inner.lock();
        inner.stop_calls.push(hosts.clone());
        let stopped: HostSet = hosts.difference(&inner.stop_failures).cloned().collect();
        // Drained workers deregister from the scheduler.
        inner.registered.retain(|h| !stopped.contains(h));
        stopped
    }

    async fn stop_workers_locally(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.stop_local_calls += 1;
        !inner.fail_stop_local
    }

    async fn is_mjs_running(&self) -> bool {
        self.inner.lock().mjs_running
    }

    async fn is_job_manager_running(&self) -> bool {
        self.inner.lock().job_manager_running
    }

    async fn stop_mjs(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.op_log.push("stop_mjs");
        if inner.fail_stop_mjs {
            return false;
        }
        inner.mjs_running = false;
        true
    }

    async fn stop_job_manager(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.op_log.push("stop_job_manager");
        if inner.fail_stop_job_manager {
            return false;
        }
        inner.job_manager_running = false;
        true
    }

    async fn shutdown_instance(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.op_log.push("shutdown");
        !inner.fail_shutdown
    }
}
