// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load, validate, and persist the state document.
//!
//! The store is the only writer of the on-disk file. Other components read
//! the document through [`StateStore::config`] / [`StateStore::state`] and
//! propose changes through [`StateStore::update_state`]; accepted changes
//! mark the store dirty until the next successful [`StateStore::flush`].

use crate::document::{keys, StateConfig, StateDocument, StateFields};
use chrono::{DateTime, NaiveDateTime, Utc};
use cm_core::consts::{BOOT_TIME_TOLERANCE_SECONDS, MJS_BUSY_MARKER};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Layout of the boot timestamp recorded in the state document.
const BOOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from state document operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state document {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("state document {path} contains invalid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("recorded boot time {value:?} is not a valid timestamp")]
    InvalidBootTime { value: String },
    #[error("failed to serialize state document: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to persist state document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Source of the OS boot time, injectable so tests can simulate reboots.
pub trait BootTimeSource {
    /// Boot time as wall-clock seconds since the Unix epoch.
    fn boot_time_epoch_seconds(&self) -> i64;
}

/// Real boot time as reported by the OS.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBootTime;

impl BootTimeSource for SystemBootTime {
    fn boot_time_epoch_seconds(&self) -> i64 {
        sysinfo::System::boot_time() as i64
    }
}

/// Owner of the on-disk state document and its in-memory copy.
pub struct StateStore {
    path: PathBuf,
    doc: StateDocument,
    dirty: bool,
}

impl StateStore {
    /// Read and bootstrap the state document.
    ///
    /// Bootstrapping runs two steps before the store is handed out: reboot
    /// detection (resetting the per-boot state fields when the OS boot time
    /// moved by more than the tolerance) and the busy-history scan of the
    /// scheduler status log. When either step changes the document, it is
    /// flushed immediately so the new boot stamp survives a crash later in
    /// the invocation.
    pub fn load(path: PathBuf, boot: &dyn BootTimeSource) -> Result<Self, StateError> {
        let raw = fs::read_to_string(&path).map_err(|source| StateError::Read {
            path: path.clone(),
            source,
        })?;
        let doc: StateDocument =
            serde_json::from_str(&raw).map_err(|source| StateError::Parse {
                path: path.clone(),
                source,
            })?;

        let mut store = Self {
            path,
            doc,
            dirty: false,
        };
        store.initialize_after_reboot(boot)?;
        store.record_busy_history();
        if store.dirty {
            if let Err(e) = store.flush() {
                warn!(error = %e, "failed to persist the bootstrapped state document");
            }
        }
        Ok(store)
    }

    /// Read-only view of the configuration section.
    pub fn config(&self) -> &StateConfig {
        &self.doc.config
    }

    /// Current state section.
    pub fn state(&self) -> &StateFields {
        &self.doc.state
    }

    /// Whether accepted updates are waiting for a flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a batch of proposed state updates.
    ///
    /// `updates` must be a JSON object. Pairs whose key is not in the state
    /// schema, or whose value does not match the declared kind, are logged
    /// and dropped; they never reach the document. Accepted pairs mutate the
    /// in-memory state and mark the store dirty.
    pub fn update_state(&mut self, updates: Value) {
        let Value::Object(updates) = updates else {
            warn!("ignoring state update that is not a JSON object");
            return;
        };
        debug!("updating cluster management program state:");
        for (key, value) in &updates {
            if self.doc.state.apply(key, value) {
                debug!(" - {key}: {value}");
                self.dirty = true;
            } else {
                warn!(%key, %value, "rejecting state update with unknown key or wrong value kind");
            }
        }
    }

    /// Persist the whole document atomically: write a temp file, fsync, then
    /// rename over the target. The dirty flag is cleared only on success.
    pub fn flush(&mut self) -> Result<(), StateError> {
        let json =
            serde_json::to_string_pretty(&self.doc).map_err(StateError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        let write = |path: &Path| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()
        };
        write(&tmp)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.dirty = false;
        Ok(())
    }

    /// Reset the per-boot state fields when this is the first run after a
    /// reboot, and clear the first-run marker on the run after that.
    fn initialize_after_reboot(&mut self, boot: &dyn BootTimeSource) -> Result<(), StateError> {
        if self.is_first_run_after_reboot(boot)? {
            debug!("first run after a reboot; initializing program state");
            self.update_state(serde_json::json!({
                (keys::FIRST_RUN_AFTER_REBOOT): true,
                (keys::CLUSTER_READY_FOR_TERMINATION): false,
                (keys::WAS_MJS_BUSY): false,
                (keys::MW_STATE_SET): false,
                (keys::MW_STATE_COUNTER): "0",
            }));
            let log = self.doc.config.mjs_status_log_file.clone();
            if log.exists() {
                debug!(
                    path = %log.display(),
                    "deleting the scheduler status log; it may contain stale timestamps"
                );
                if let Err(e) = fs::remove_file(&log) {
                    warn!(path = %log.display(), error = %e, "failed to delete the status log");
                }
            }
        } else if self.doc.state.first_run_after_reboot {
            self.update_state(serde_json::json!({ (keys::FIRST_RUN_AFTER_REBOOT): false }));
        }
        Ok(())
    }

    /// Compare the recorded boot time with the current one, tolerating the
    /// small deviations the OS can report between reads. Records the current
    /// boot time when it changed or was never stored.
    fn is_first_run_after_reboot(
        &mut self,
        boot: &dyn BootTimeSource,
    ) -> Result<bool, StateError> {
        let current = boot.boot_time_epoch_seconds();
        let stored = self.doc.state.last_os_boot_time.clone();

        if stored.is_empty() {
            // First run after deployment, not a reboot
            self.record_boot_time(current);
            return Ok(false);
        }

        let parsed = NaiveDateTime::parse_from_str(&stored, BOOT_TIME_FORMAT)
            .map_err(|_| StateError::InvalidBootTime { value: stored })?;
        let elapsed = current - parsed.and_utc().timestamp();
        if elapsed.abs() > BOOT_TIME_TOLERANCE_SECONDS {
            // Boot time only moves when the OS rebooted
            self.record_boot_time(current);
            return Ok(true);
        }
        Ok(false)
    }

    fn record_boot_time(&mut self, epoch_seconds: i64) {
        let stamp = DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
            .unwrap_or_else(Utc::now)
            .format(BOOT_TIME_FORMAT)
            .to_string();
        self.update_state(serde_json::json!({ (keys::LAST_OS_BOOT_TIME): stamp }));
    }

    /// Record that the scheduler has been busy at least once since boot, by
    /// scanning its status log. A missing log is not an error.
    fn record_busy_history(&mut self) {
        if self.doc.state.was_mjs_busy {
            return;
        }
        let log = &self.doc.config.mjs_status_log_file;
        if log.as_os_str().is_empty() {
            return;
        }
        match fs::read_to_string(log) {
            Ok(content) if content.contains(MJS_BUSY_MARKER) => {
                debug!("scheduler found to have been busy; recording it in the state document");
                self.update_state(serde_json::json!({ (keys::WAS_MJS_BUSY): true }));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %log.display(), error = %e, "failed to read the status log");
            }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
