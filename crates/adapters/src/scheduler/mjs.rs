// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MJS adapter: drives the scheduler's CLI tools as subprocesses.
//!
//! Local tools (`resize`, `mjs`, `nodestatus`) run unbounded; per-host
//! remote calls (`nodestatus -remotehost`, `stopworker -remotehost`) go
//! through a shared semaphore and a hard wall-clock timeout, with the child
//! process killed when the timeout fires.

use super::output::{NodeStatus, ResizeJobManager, ResizeStatus, ResizeWorker};
use super::SchedulerPort;
use crate::cloud::HostSet;
use async_trait::async_trait;
use cm_core::consts::{
    MATLAB_MNT_ROOT, MATLAB_ROOT, MATLAB_ROOT_WINDOWS, REMOTE_CALL_LIMIT,
    REMOTE_CALL_TIMEOUT_SECONDS,
};
use cm_core::ClusterCapacity;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Worker OS family served by this head node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerOs {
    Linux,
    Windows,
}

impl WorkerOs {
    /// Family of the host this program runs on.
    pub fn host() -> Self {
        if cfg!(windows) {
            WorkerOs::Windows
        } else {
            WorkerOs::Linux
        }
    }

    /// Key of this family in the `resize status` capacity maps.
    pub(crate) fn status_key(self) -> &'static str {
        match self {
            WorkerOs::Linux => "linux",
            WorkerOs::Windows => "windows",
        }
    }

    /// Flag selecting this family for `resize update`.
    pub(crate) fn max_workers_flag(self) -> &'static str {
        match self {
            WorkerOs::Linux => "-maxlinuxworkers",
            WorkerOs::Windows => "-maxwindowsworkers",
        }
    }

    /// Executable file name of a scheduler CLI tool.
    pub(crate) fn tool_file(self, base: &str) -> String {
        match self {
            WorkerOs::Linux => base.to_string(),
            WorkerOs::Windows => format!("{base}.bat"),
        }
    }

    /// Directory containing the Parallel Computing Toolbox binaries.
    fn parallel_bin_root(self) -> PathBuf {
        self.matlab_root().join("toolbox").join("parallel").join("bin")
    }

    fn matlab_root(self) -> PathBuf {
        match self {
            WorkerOs::Linux => {
                let root = PathBuf::from(MATLAB_ROOT);
                if root.exists() {
                    root
                } else {
                    PathBuf::from(MATLAB_MNT_ROOT)
                }
            }
            WorkerOs::Windows => {
                let pattern = format!("{MATLAB_ROOT_WINDOWS}\\R????[ab]");
                glob::glob(&pattern)
                    .ok()
                    .and_then(|mut paths| paths.next())
                    .and_then(|entry| entry.ok())
                    .unwrap_or_else(|| PathBuf::from(MATLAB_ROOT_WINDOWS))
            }
        }
    }
}

/// Scheduler port backed by the MJS command-line tools.
#[derive(Clone)]
pub struct MjsAdapter {
    worker_os: WorkerOs,
    bin_root: PathBuf,
    limiter: Arc<Semaphore>,
}

impl Default for MjsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MjsAdapter {
    pub fn new() -> Self {
        Self::with_concurrency(REMOTE_CALL_LIMIT)
    }

    /// Build an adapter with a custom remote-call fan-out width (tests use
    /// width 1 for determinism).
    pub fn with_concurrency(width: usize) -> Self {
        let worker_os = WorkerOs::host();
        Self {
            worker_os,
            bin_root: worker_os.parallel_bin_root(),
            limiter: Arc::new(Semaphore::new(width)),
        }
    }

    fn tool(&self, base: &str) -> PathBuf {
        self.bin_root.join(self.worker_os.tool_file(base))
    }

    /// Run a local scheduler tool to completion.
    async fn run_tool(&self, base: &str, args: &[&str]) -> Option<std::process::Output> {
        let exe = self.tool(base);
        match Command::new(&exe).args(args).output().await {
            Ok(output) => {
                if !output.status.success() {
                    debug!(
                        tool = base,
                        stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "scheduler tool failed"
                    );
                }
                Some(output)
            }
            Err(e) => {
                warn!(tool = %exe.display(), error = %e, "failed to launch scheduler tool");
                None
            }
        }
    }

    /// Run a per-host scheduler tool under the shared fan-out limit, with a
    /// hard timeout. Returns `None` on launch failure, non-zero exit, or
    /// timeout; the child is killed when the timeout fires.
    async fn run_remote_tool(&self, base: &str, args: &[&str], host: &str) -> Option<Vec<u8>> {
        let _permit = self.limiter.acquire().await.ok()?;
        let exe = self.tool(base);
        let child = match Command::new(&exe)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = %exe.display(), error = %e, "failed to launch scheduler tool");
                return None;
            }
        };
        let budget = Duration::from_secs(REMOTE_CALL_TIMEOUT_SECONDS);
        match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Some(output.stdout),
            Ok(Ok(output)) => {
                // Bad host, or MJS is not up there yet (may be a new node)
                debug!(
                    tool = base,
                    host,
                    stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "remote scheduler tool failed"
                );
                None
            }
            Ok(Err(e)) => {
                warn!(tool = base, host, error = %e, "remote scheduler tool did not finish");
                None
            }
            Err(_) => {
                debug!(
                    tool = base,
                    host,
                    timeout_seconds = REMOTE_CALL_TIMEOUT_SECONDS,
                    "remote scheduler tool timed out"
                );
                None
            }
        }
    }

    /// The job manager's `resize status` entry.
    async fn resize_status(&self) -> Option<ResizeJobManager> {
        let output = self.run_tool("resize", &["status"]).await?;
        if !output.status.success() {
            return None;
        }
        match serde_json::from_slice::<ResizeStatus>(&output.stdout) {
            Ok(status) => status.into_job_manager(),
            Err(e) => {
                warn!(error = %e, "failed to parse resize status output");
                None
            }
        }
    }

    /// Hosts with registered workers, or `None` when the scheduler could not
    /// be queried.
    async fn registered_nodes(&self) -> Option<HostSet> {
        let jm = self.resize_status().await?;
        Some(jm.workers.into_iter().map(|w| w.host).collect())
    }

    /// Worker-group status reported by a remote host.
    async fn workergroup_status(&self, host: &str) -> Option<String> {
        let stdout = self
            .run_remote_tool("nodestatus", &["-json", "-remotehost", host], host)
            .await?;
        match serde_json::from_slice::<NodeStatus>(&stdout) {
            Ok(status) => status.worker_group.map(|wg| wg.status),
            Err(e) => {
                debug!(host, error = %e, "failed to parse nodestatus output");
                None
            }
        }
    }

    /// Drain the workers of one remote host, only if they are idle.
    async fn stop_workers_on_node(&self, host: &str) -> bool {
        self.run_remote_tool("stopworker", &["-onidle", "-all", "-remotehost", host], host)
            .await
            .is_some()
    }
}

#[async_trait]
impl SchedulerPort for MjsAdapter {
    async fn cluster_capacity(&self) -> Option<ClusterCapacity> {
        let jm = self.resize_status().await?;
        let key = self.worker_os.status_key();
        let (desired, max) = match (jm.desired_workers.get(key), jm.max_workers.get(key)) {
            (Some(desired), Some(max)) => (*desired, *max),
            _ => {
                warn!(worker_os = key, "resize status is missing this worker OS family");
                return None;
            }
        };
        Some(ClusterCapacity {
            current_workers: jm.workers.len() as u32,
            desired_workers: desired,
            maximum_workers: max,
        })
    }

    async fn nodes_idle_seconds(&self) -> HashMap<String, u64> {
        match self.resize_status().await {
            Some(jm) => fold_idle_seconds(&jm.workers),
            None => HashMap::new(),
        }
    }

    async fn suspended_nodes(&self, known_good: &HostSet) -> Option<HostSet> {
        let registered = self.registered_nodes().await?;
        let candidates: Vec<String> = registered.difference(known_good).cloned().collect();

        let mut probes = JoinSet::new();
        for host in candidates {
            let adapter = self.clone();
            probes.spawn(async move {
                let status = adapter.workergroup_status(&host).await;
                (host, status)
            });
        }
        let mut bad = HostSet::new();
        while let Some(result) = probes.join_next().await {
            if let Ok((host, Some(status))) = result {
                if status == "Suspended" {
                    bad.insert(host);
                }
            }
        }
        Some(bad)
    }

    async fn worker_nodes(&self) -> HostSet {
        self.registered_nodes().await.unwrap_or_default()
    }

    async fn set_cluster_capacity(&self, maximum_workers: u32) -> bool {
        let flag = self.worker_os.max_workers_flag();
        self.run_tool("resize", &["update", flag, &maximum_workers.to_string()])
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn stop_workers_on_nodes(&self, hosts: &HostSet) -> HostSet {
        let mut drains = JoinSet::new();
        for host in hosts {
            let adapter = self.clone();
            let host = host.clone();
            drains.spawn(async move {
                let stopped = adapter.stop_workers_on_node(&host).await;
                (host, stopped)
            });
        }
        let mut drained = HostSet::new();
        while let Some(result) = drains.join_next().await {
            if let Ok((host, true)) = result {
                drained.insert(host);
            }
        }

        // Make sure the workers actually deregistered.
        let still_registered = self.worker_nodes().await;
        drained.retain(|host| !still_registered.contains(host));
        drained
    }

    async fn stop_workers_locally(&self) -> bool {
        self.run_tool("stopworker", &["-all"])
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn is_mjs_running(&self) -> bool {
        match self.run_tool("mjs", &["status"]).await {
            Some(output) => String::from_utf8_lossy(&output.stdout)
                .contains("MATLAB Parallel Server is running"),
            None => false,
        }
    }

    async fn is_job_manager_running(&self) -> bool {
        let Some(output) = self.run_tool("nodestatus", &["-json"]).await else {
            return false;
        };
        if !output.status.success() {
            return false;
        }
        match serde_json::from_slice::<NodeStatus>(&output.stdout) {
            Ok(status) => status
                .job_managers
                .first()
                .map(|jm| jm.status.eq_ignore_ascii_case("running"))
                .unwrap_or(false),
            Err(e) => {
                debug!(error = %e, "failed to parse nodestatus output");
                false
            }
        }
    }

    async fn stop_mjs(&self) -> bool {
        if !self.is_mjs_running().await {
            return true;
        }
        self.run_tool("mjs", &["stop", "-cleanPreserveJobs"])
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn stop_job_manager(&self) -> bool {
        if !self.is_job_manager_running().await {
            return true;
        }
        let Some(jm) = self.resize_status().await else {
            return true;
        };
        self.run_tool("stopjobmanager", &["-name", &jm.name, "-cleanPreserveJobs"])
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn shutdown_instance(&self) -> bool {
        let result = match self.worker_os {
            WorkerOs::Linux => Command::new("sudo").args(["shutdown", "-h", "now"]).status().await,
            WorkerOs::Windows => Command::new("shutdown").args(["/s", "/t", "0"]).status().await,
        };
        match result {
            Ok(status) => status.success(),
            Err(e) => {
                warn!(error = %e, "failed to issue the shutdown command");
                false
            }
        }
    }
}

/// Collapse per-worker idle seconds into per-host figures, keeping the
/// minimum per host.
fn fold_idle_seconds(workers: &[ResizeWorker]) -> HashMap<String, u64> {
    let mut seconds_idle: HashMap<String, u64> = HashMap::new();
    for worker in workers {
        seconds_idle
            .entry(worker.host.clone())
            .and_modify(|s| *s = (*s).min(worker.seconds_idle))
            .or_insert(worker.seconds_idle);
    }
    seconds_idle
}

#[cfg(test)]
#[path = "mjs_tests.rs"]
mod tests;
