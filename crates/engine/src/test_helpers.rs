// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared builders for engine tests.

use cm_adapters::HostSet;
use cm_core::{CloudCapacity, ClusterCapacity};
use cm_storage::test_support::seeded_store;
use cm_storage::StateStore;
use std::path::Path;

/// Boot epoch used by every engine test.
pub(crate) const BOOT: i64 = 1_700_000_000;

/// Load a store seeded with the given document sections.
pub(crate) fn store_in(
    dir: &Path,
    config: serde_json::Value,
    state: serde_json::Value,
) -> StateStore {
    seeded_store(dir, config, state, BOOT).unwrap()
}

/// Boot stamp matching [`BOOT`], for seeding `last_os_boot_time`.
pub(crate) fn boot_stamp() -> String {
    chrono::DateTime::from_timestamp(BOOT, 0)
        .unwrap()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub(crate) fn cloud_capacity(
    minimum: u32,
    desired: u32,
    maximum: u32,
    current: u32,
    workers_per_node: u32,
) -> CloudCapacity {
    CloudCapacity {
        desired_nodes: desired,
        minimum_nodes: minimum,
        maximum_nodes: maximum,
        current_nodes: current,
        workers_per_node,
    }
}

pub(crate) fn cluster_capacity(current: u32, desired: u32, maximum: u32) -> ClusterCapacity {
    ClusterCapacity {
        current_workers: current,
        desired_workers: desired,
        maximum_workers: maximum,
    }
}

pub(crate) fn hosts(names: impl IntoIterator<Item = &'static str>) -> HostSet {
    names.into_iter().map(str::to_string).collect()
}
