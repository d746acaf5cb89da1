// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process status codes and the mw-state tag values.

use std::fmt;

/// Outcome of a routine, doubling as the process exit code.
///
/// Routines aggregate their external-call failures into one of these values;
/// the orchestrator combines them with [`Status::merge`] so the worst issue
/// wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    /// Everything the routine attempted succeeded.
    Ok,
    /// A cloud platform call failed or returned malformed data.
    Cloud,
    /// A scheduler call failed or the cluster state was inconsistent.
    Cluster,
    /// Independent cloud and cluster failures in the same routine.
    Both,
    /// The state document could not be read or written.
    InternalIo,
}

impl Status {
    /// Numeric process exit code.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Cloud => 1,
            Status::Cluster => 2,
            Status::Both => 3,
            Status::InternalIo => 4,
        }
    }

    /// Combine two statuses, keeping the more severe one.
    pub fn merge(self, other: Status) -> Status {
        self.max(other)
    }

    /// Fold a routine's local issue flags into a status.
    pub fn from_issues(cloud_issue: bool, cluster_issue: bool) -> Status {
        match (cloud_issue, cluster_issue) {
            (true, true) => Status::Both,
            (true, false) => Status::Cloud,
            (false, true) => Status::Cluster,
            (false, false) => Status::Ok,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Cloud => write!(f, "cloud-issue"),
            Status::Cluster => write!(f, "cluster-issue"),
            Status::Both => write!(f, "cloud-and-cluster-issue"),
            Status::InternalIo => write!(f, "internal-io-issue"),
        }
    }
}

/// Value of the `mw-state` head-node tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MwState {
    Ready,
    Timeout,
}

impl MwState {
    pub fn as_str(self) -> &'static str {
        match self {
            MwState::Ready => "ready",
            MwState::Timeout => "timeout",
        }
    }
}

impl fmt::Display for MwState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
