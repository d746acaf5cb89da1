// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers: fake boot-time source and document seeding.

use crate::{BootTimeSource, StateError, StateStore};
use std::path::{Path, PathBuf};

/// Fixed boot time for tests.
#[derive(Clone, Copy, Debug)]
pub struct FakeBootTime(pub i64);

impl BootTimeSource for FakeBootTime {
    fn boot_time_epoch_seconds(&self) -> i64 {
        self.0
    }
}

/// Write a state document with the given `config` and `state` sections into
/// `dir` and return its path.
#[allow(clippy::unwrap_used)]
pub fn seed_document(
    dir: &Path,
    config: serde_json::Value,
    state: serde_json::Value,
) -> PathBuf {
    let path = dir.join("cluster_management_data.json");
    let doc = serde_json::json!({ "config": config, "state": state });
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}

/// Seed a document and load it with a fixed boot time.
pub fn seeded_store(
    dir: &Path,
    config: serde_json::Value,
    state: serde_json::Value,
    boot_epoch_seconds: i64,
) -> Result<StateStore, StateError> {
    let path = seed_document(dir, config, state);
    StateStore::load(path, &FakeBootTime(boot_epoch_seconds))
}
