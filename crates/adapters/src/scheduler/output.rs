// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde models of the scheduler CLI tools' JSON output.

use serde::Deserialize;
use std::collections::HashMap;

/// Output of `resize status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResizeStatus {
    #[serde(default)]
    pub job_managers: Vec<ResizeJobManager>,
}

impl ResizeStatus {
    /// The job manager entry this program operates on.
    pub fn into_job_manager(self) -> Option<ResizeJobManager> {
        self.job_managers.into_iter().next_back()
    }
}

/// Per-job-manager section of `resize status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResizeJobManager {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub workers: Vec<ResizeWorker>,
    /// Desired workers keyed by worker OS family.
    #[serde(default)]
    pub desired_workers: HashMap<String, u32>,
    /// Maximum workers keyed by worker OS family.
    #[serde(default)]
    pub max_workers: HashMap<String, u32>,
}

/// One registered worker in `resize status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResizeWorker {
    pub host: String,
    #[serde(default)]
    pub seconds_idle: u64,
}

/// Output of `nodestatus -json`, locally or for a remote host.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeStatus {
    #[serde(default)]
    pub job_managers: Vec<JobManagerStatus>,
    pub worker_group: Option<WorkerGroupStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobManagerStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkerGroupStatus {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
