// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{cloud_capacity, cluster_capacity};
use cm_adapters::{FakeCloudPort, FakeSchedulerPort};

#[tokio::test]
async fn aligns_both_capacities_when_they_drift() {
    // Scale-up scenario: the user asked the scheduler for 12 workers on a
    // group of 2 running nodes with 4 workers each.
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(0, 2, 10, 2, 4));
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(8, 12, 8));

    let status = run(&cloud, &scheduler).await;

    assert_eq!(status, Status::Ok);
    assert_eq!(scheduler.set_capacity_calls(), vec![40], "max workers = 10 nodes x 4");
    assert_eq!(cloud.desired_capacity_calls(), vec![3], "desired nodes = ceil(12 / 4)");
}

#[tokio::test]
async fn no_writes_when_everything_matches() {
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(0, 3, 10, 3, 4));
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(12, 12, 40));

    let status = run(&cloud, &scheduler).await;

    assert_eq!(status, Status::Ok);
    assert!(scheduler.set_capacity_calls().is_empty());
    assert!(cloud.desired_capacity_calls().is_empty());
}

#[tokio::test]
async fn nudges_the_platform_while_current_lags_desired() {
    // desired == requested, but only 1 of 3 nodes is running; the platform
    // gets asked again so it reassesses.
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(0, 3, 10, 1, 4));
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(4, 12, 40));

    let status = run(&cloud, &scheduler).await;

    assert_eq!(status, Status::Ok);
    assert_eq!(cloud.desired_capacity_calls(), vec![3]);
}

#[tokio::test]
async fn desired_nodes_stay_within_the_group_bounds() {
    // 100 desired workers on 4-worker nodes would need 25 nodes; the group
    // caps out at 10.
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(2, 2, 10, 2, 4));
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(8, 100, 40));
    run(&cloud, &scheduler).await;
    assert_eq!(cloud.desired_capacity_calls(), vec![10]);

    // Zero desired workers is still held up by the minimum.
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(2, 2, 10, 2, 4));
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(8, 0, 40));
    run(&cloud, &scheduler).await;
    assert_eq!(cloud.desired_capacity_calls(), vec![2]);
}

#[tokio::test]
async fn unreadable_cloud_capacity_is_a_cloud_issue() {
    let cloud = FakeCloudPort::new();
    let scheduler =
        FakeSchedulerPort::new().with_cluster_capacity(cluster_capacity(0, 0, 0));
    assert_eq!(run(&cloud, &scheduler).await, Status::Cloud);
}

#[tokio::test]
async fn unreadable_cluster_capacity_is_a_cluster_issue() {
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(0, 2, 10, 2, 4));
    let scheduler = FakeSchedulerPort::new();
    assert_eq!(run(&cloud, &scheduler).await, Status::Cluster);
}

#[tokio::test]
async fn write_failures_combine_into_both() {
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 2, 10, 2, 4))
        .failing_set_capacity();
    let scheduler = FakeSchedulerPort::new()
        .with_cluster_capacity(cluster_capacity(8, 12, 8))
        .failing_set_capacity();

    assert_eq!(run(&cloud, &scheduler).await, Status::Both);
}

#[test]
fn node_count_rounds_up() {
    let cloud = cloud_capacity(0, 2, 10, 2, 4);
    assert_eq!(node_count_for_workers(12, &cloud), 3);
    assert_eq!(node_count_for_workers(13, &cloud), 4);
    assert_eq!(node_count_for_workers(1, &cloud), 1);
}

#[test]
fn node_count_tolerates_min_above_max() {
    // Transient platform state: the minimum wins, and no panic.
    let cloud = cloud_capacity(5, 2, 3, 2, 4);
    assert_eq!(node_count_for_workers(100, &cloud), 5);
}
