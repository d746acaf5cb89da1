// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm: Entry points of the cluster lifecycle manager
//!
//! Two no-argument binaries share this crate: `cluster-management`, invoked
//! by the system scheduler roughly once a minute, and `spot-interruption`,
//! the one-shot handler wired to the spot reclamation warning.

pub mod logging;
pub mod paths;
