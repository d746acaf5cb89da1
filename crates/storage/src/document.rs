// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk state document: a read-only `config` section and a mutable,
//! schema-validated `state` section.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Names of the mutable state fields, for use with
/// [`StateStore::update_state`](crate::StateStore::update_state).
pub mod keys {
    pub const CLUSTER_READY_FOR_TERMINATION: &str = "cluster_ready_for_termination";
    pub const WAS_MJS_BUSY: &str = "was_mjs_busy";
    pub const FIRST_RUN_AFTER_REBOOT: &str = "first_run_after_reboot";
    pub const LAST_TERMINATION_POLICY: &str = "last_termination_policy";
    pub const LAST_OS_BOOT_TIME: &str = "last_os_boot_time";
    pub const CLUSTER_AUTO_TERMINATED: &str = "cluster_auto_terminated";
    pub const MIN_NODES_PRE_TERMINATION: &str = "min_nodes_pre_termination";
    pub const MW_STATE_SET: &str = "mw_state_set";
    pub const MW_STATE_COUNTER: &str = "mw_state_counter";
}

/// Complete document as stored on disk.
///
/// Unknown keys in either section survive a load/flush cycle through the
/// flattened `extra` maps, so a rewrite never loses fields this program does
/// not know about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StateDocument {
    pub config: StateConfig,
    pub state: StateFields,
}

/// Configuration section. Written at deployment time, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub autoscaling_enabled: bool,
    #[serde(default)]
    pub autotermination_enabled: bool,
    #[serde(default)]
    pub initial_termination_policy: String,
    #[serde(default)]
    pub initial_desired_capacity: u32,
    #[serde(default)]
    pub mjs_status_log_file: PathBuf,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

/// Mutable state section, tracking what the program has already done across
/// invocations and reboots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFields {
    #[serde(default)]
    pub cluster_ready_for_termination: bool,
    #[serde(default)]
    pub was_mjs_busy: bool,
    #[serde(default)]
    pub first_run_after_reboot: bool,
    #[serde(default)]
    pub last_termination_policy: String,
    #[serde(default)]
    pub last_os_boot_time: String,
    #[serde(default)]
    pub cluster_auto_terminated: bool,
    /// Stored as a decimal string; see [`StateFields::min_nodes_pre_termination_value`].
    #[serde(default)]
    pub min_nodes_pre_termination: String,
    #[serde(default)]
    pub mw_state_set: bool,
    /// Stored as a decimal string; see [`StateFields::mw_state_counter_value`].
    #[serde(default = "zero_string")]
    pub mw_state_counter: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

fn zero_string() -> String {
    "0".to_string()
}

impl Default for StateFields {
    fn default() -> Self {
        Self {
            cluster_ready_for_termination: false,
            was_mjs_busy: false,
            first_run_after_reboot: false,
            last_termination_policy: String::new(),
            last_os_boot_time: String::new(),
            cluster_auto_terminated: false,
            min_nodes_pre_termination: String::new(),
            mw_state_set: false,
            mw_state_counter: zero_string(),
            extra: serde_json::Map::new(),
        }
    }
}

impl StateFields {
    /// Numeric view of the string-typed readiness attempt counter.
    pub fn mw_state_counter_value(&self) -> u32 {
        self.mw_state_counter.trim().parse().unwrap_or(0)
    }

    /// Numeric view of the string-typed pre-termination minimum node count.
    pub fn min_nodes_pre_termination_value(&self) -> u32 {
        self.min_nodes_pre_termination.trim().parse().unwrap_or(0)
    }

    /// Apply one proposed update. Returns false when the key is not part of
    /// the schema or the value does not have the declared kind; the field is
    /// left untouched in that case.
    pub(crate) fn apply(&mut self, key: &str, value: &Value) -> bool {
        match key {
            keys::CLUSTER_READY_FOR_TERMINATION => {
                set_bool(&mut self.cluster_ready_for_termination, value)
            }
            keys::WAS_MJS_BUSY => set_bool(&mut self.was_mjs_busy, value),
            keys::FIRST_RUN_AFTER_REBOOT => set_bool(&mut self.first_run_after_reboot, value),
            keys::LAST_TERMINATION_POLICY => set_text(&mut self.last_termination_policy, value),
            keys::LAST_OS_BOOT_TIME => set_text(&mut self.last_os_boot_time, value),
            keys::CLUSTER_AUTO_TERMINATED => set_bool(&mut self.cluster_auto_terminated, value),
            keys::MIN_NODES_PRE_TERMINATION => {
                set_text(&mut self.min_nodes_pre_termination, value)
            }
            keys::MW_STATE_SET => set_bool(&mut self.mw_state_set, value),
            keys::MW_STATE_COUNTER => set_text(&mut self.mw_state_counter, value),
            _ => false,
        }
    }
}

fn set_bool(field: &mut bool, value: &Value) -> bool {
    match value {
        Value::Bool(b) => {
            *field = *b;
            true
        }
        _ => false,
    }
}

fn set_text(field: &mut String, value: &Value) -> bool {
    match value {
        Value::String(s) => {
            *field = s.clone();
            true
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
