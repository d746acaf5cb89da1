// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed file locations, relative to the installed executable.

use std::path::PathBuf;

/// Location of the persisted state document. `CM_DATA_FILE` overrides the
/// default of `data/cluster_management_data.json` next to the executable.
pub fn state_document_path() -> PathBuf {
    if let Ok(path) = std::env::var("CM_DATA_FILE") {
        return PathBuf::from(path);
    }
    exe_dir().join("data").join("cluster_management_data.json")
}

/// Directory holding the running executable, falling back to the working
/// directory when it cannot be determined.
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
