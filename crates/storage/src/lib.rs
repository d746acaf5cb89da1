// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm-storage: The persisted cluster management state document

mod document;
mod store;

pub use document::{keys, StateConfig, StateFields};
pub use store::{BootTimeSource, StateError, StateStore, SystemBootTime};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
