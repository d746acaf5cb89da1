// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn worker(host: &str, seconds_idle: u64) -> ResizeWorker {
    ResizeWorker { host: host.to_string(), seconds_idle }
}

#[test]
fn idle_seconds_keep_the_minimum_per_host() {
    // A host is only idle when all of its workers are.
    let workers = vec![worker("h1", 120), worker("h1", 30), worker("h2", 900)];
    let idle = fold_idle_seconds(&workers);
    assert_eq!(idle["h1"], 30);
    assert_eq!(idle["h2"], 900);
}

#[test]
fn idle_seconds_empty_for_no_workers() {
    assert!(fold_idle_seconds(&[]).is_empty());
}

#[parameterized(
    linux = { WorkerOs::Linux, "resize", "-maxlinuxworkers", "linux" },
    windows = { WorkerOs::Windows, "resize.bat", "-maxwindowsworkers", "windows" },
)]
fn worker_os_tooling(os: WorkerOs, resize_file: &str, flag: &str, key: &str) {
    assert_eq!(os.tool_file("resize"), resize_file);
    assert_eq!(os.max_workers_flag(), flag);
    assert_eq!(os.status_key(), key);
}
