// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::hosts;
use cm_adapters::{FakeCloudPort, FakeSchedulerPort};

#[tokio::test]
async fn suspended_node_is_flagged_unhealthy() {
    // h3 registered with the scheduler but is not in the cloud-good set and
    // reports a suspended worker group.
    let cloud = FakeCloudPort::new().with_worker_nodes(["h1", "h2"]);
    let scheduler = FakeSchedulerPort::new()
        .with_registered_nodes(["h1", "h2", "h3"])
        .with_suspended_nodes(["h3"]);

    let status = run(&cloud, &scheduler).await;

    assert_eq!(status, Status::Ok);
    assert_eq!(cloud.unhealthy_calls(), vec![hosts(["h3"])]);
    // The probe is scoped by the cloud-good set.
    assert_eq!(scheduler.suspended_queries(), vec![hosts(["h1", "h2"])]);
}

#[tokio::test]
async fn healthy_cluster_flags_nothing() {
    let cloud = FakeCloudPort::new().with_worker_nodes(["h1", "h2"]);
    let scheduler = FakeSchedulerPort::new().with_registered_nodes(["h1", "h2"]);

    let status = run(&cloud, &scheduler).await;

    assert_eq!(status, Status::Ok);
    assert!(cloud.unhealthy_calls().is_empty());
}

#[tokio::test]
async fn unreadable_cloud_nodes_is_a_cloud_issue() {
    let cloud = FakeCloudPort::new();
    let scheduler = FakeSchedulerPort::new();
    assert_eq!(run(&cloud, &scheduler).await, Status::Cloud);
}

#[tokio::test]
async fn unreadable_scheduler_probe_is_a_cluster_issue() {
    let cloud = FakeCloudPort::new().with_worker_nodes(["h1"]);
    let scheduler = FakeSchedulerPort::new().failing_suspended_nodes();
    assert_eq!(run(&cloud, &scheduler).await, Status::Cluster);
}

#[tokio::test]
async fn failed_health_write_is_a_cloud_issue() {
    let cloud = FakeCloudPort::new()
        .with_worker_nodes(["h1"])
        .failing_set_unhealthy();
    let scheduler = FakeSchedulerPort::new()
        .with_registered_nodes(["h1", "h2"])
        .with_suspended_nodes(["h2"]);
    assert_eq!(run(&cloud, &scheduler).await, Status::Cloud);
}
