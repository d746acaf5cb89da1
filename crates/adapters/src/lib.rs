// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm-adapters: Ports to the cloud platform and the job scheduler
//!
//! The reconciliation engine talks to the outside world through two traits:
//!
//! - [`CloudPort`] — the cloud scaling group (capacity, protection, health,
//!   head-node tags)
//! - [`SchedulerPort`] — the MATLAB Job Scheduler on the head node and its
//!   worker nodes (capacities, idle times, worker-group probes, drains)
//!
//! Concrete adapters: [`AwsCloudAdapter`] (Auto Scaling Group + EC2, wired
//! up via the instance metadata service and the CloudFormation stack) and
//! [`MjsAdapter`] (subprocess invocations of the scheduler's CLI tools).
//! Fakes for both ports live behind the `test-support` feature.

pub mod cloud;
pub mod scheduler;

pub use cloud::{AwsCloudAdapter, CloudPort, CloudSetupError, HostSet};
pub use scheduler::{MjsAdapter, SchedulerPort, WorkerOs};

#[cfg(any(test, feature = "test-support"))]
pub use cloud::FakeCloudPort;
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::FakeSchedulerPort;
