// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Constants shared across the cluster management program.

/// Scaling-group tag holding the worker idle timeout, in minutes.
pub const IDLE_TIMEOUT_TAG: &str = "mwWorkerIdleTimeoutMinutes";

/// Default for [`IDLE_TIMEOUT_TAG`] when the tag is missing or invalid.
pub const IDLE_TIMEOUT_DEFAULT_MINUTES: u64 = 10;

/// Head-node tag carrying the cluster termination policy.
pub const CLUSTER_TERMINATION_TAG: &str = "mw-autoshutdown";

/// Head-node tag reporting cluster readiness.
pub const MW_STATE_TAG: &str = "mw-state";

/// Time after launch before a node is considered fully running.
pub const GRACE_PERIOD_MINUTES: u64 = 5;

/// Minimum idle window granted to a cluster that has never run a job.
pub const UNUSED_CLUSTER_TIMEOUT_SECONDS: u64 = 1800;

/// The OS can report the boot time with slight deviations between reads.
pub const BOOT_TIME_TOLERANCE_SECONDS: i64 = 5;

/// Readiness re-checks performed before the mw-state tag is set to timeout.
/// The program runs roughly once a minute, so this bounds startup at ~10 min.
pub const MW_STATE_MAX_ATTEMPTS: u32 = 10;

/// Concurrent remote scheduler CLI calls allowed at any moment.
pub const REMOTE_CALL_LIMIT: usize = 20;

/// Wall-clock budget for a single remote scheduler CLI call.
pub const REMOTE_CALL_TIMEOUT_SECONDS: u64 = 15;

/// Provider limit on instance ids per protection request.
pub const PROTECTION_BATCH_LIMIT: usize = 50;

/// Substring the scheduler writes to its status log while jobs are running.
pub const MJS_BUSY_MARKER: &str = "MJS busy";

/// MATLAB installation directories probed by the scheduler adapter.
pub const MATLAB_ROOT: &str = "/usr/local/matlab";
pub const MATLAB_MNT_ROOT: &str = "/mnt/matlab";
pub const MATLAB_ROOT_WINDOWS: &str = "C:\\Program Files\\MATLAB";
