// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autoscaling scenarios: capacity alignment, idle scale-in, unhealthy
//! replacement.

use crate::prelude::*;

fn autoscaling_config() -> serde_json::Value {
    json!({ "autoscaling_enabled": true, "autotermination_enabled": false })
}

fn steady_state() -> serde_json::Value {
    json!({ "last_os_boot_time": boot_stamp(), "mw_state_set": true })
}

#[tokio::test]
async fn capacity_up() {
    // The user asked for 12 workers; the group runs 2 nodes of 4 workers.
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path(), autoscaling_config(), steady_state());
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 2, 10, 2, 4))
        .with_worker_nodes(["h1", "h2"]);
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_registered_nodes(["h1", "h2"])
        .with_cluster_capacity(cluster_capacity(8, 12, 8));

    let code = run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;

    assert_eq!(code, 0);
    assert_eq!(scheduler.set_capacity_calls(), vec![40]);
    assert_eq!(cloud.desired_capacity_calls(), vec![3]);
}

#[tokio::test]
async fn idle_scale_in() {
    // The platform wants to shrink from 5 to 3; only nodes strictly past
    // the 600 s timeout may go, longest-idle first.
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path(), autoscaling_config(), steady_state());
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 3, 10, 5, 2))
        .with_idle_timeout_seconds(600)
        .with_worker_nodes(["h1", "h2", "h3", "h4", "h5"]);
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_registered_nodes(["h1", "h2", "h3", "h4", "h5"])
        .with_cluster_capacity(cluster_capacity(10, 6, 20))
        .with_idle_seconds([
            ("h1", 900),
            ("h2", 300),
            ("h3", 700),
            ("h4", 601),
            ("h5", 599),
        ]);

    let code = run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;

    assert_eq!(code, 0);
    let drained = scheduler.drained_hosts();
    assert_eq!(drained.len(), 2);
    assert!(drained.is_subset(&hosts(["h1", "h3", "h4"])), "only nodes past the timeout");
    assert_eq!(cloud.unprotected_hosts(), drained, "exactly the drained nodes lose protection");
}

#[tokio::test]
async fn unhealthy_replacement() {
    // h3 is past the launch grace but its worker group is suspended; it
    // must be flagged so the platform replaces it.
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path(), autoscaling_config(), steady_state());
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 3, 10, 3, 4))
        .with_worker_nodes(["h1", "h2"]);
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_registered_nodes(["h1", "h2", "h3"])
        .with_cluster_capacity(cluster_capacity(12, 12, 40))
        .with_suspended_nodes(["h3"]);

    let code = run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;

    assert_eq!(code, 0);
    assert_eq!(cloud.unhealthy_calls(), vec![hosts(["h3"])]);
}
