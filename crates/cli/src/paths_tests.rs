// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_state_path_sits_next_to_the_binary() {
    // Only assert the suffix; the exe location varies by build layout.
    if std::env::var("CM_DATA_FILE").is_ok() {
        return;
    }
    let path = state_document_path();
    assert!(path.ends_with("data/cluster_management_data.json"));
}
