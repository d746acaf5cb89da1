// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster readiness scenarios for the mw-state head-node tag.

use crate::prelude::*;

fn quiet_config() -> serde_json::Value {
    json!({ "autoscaling_enabled": false, "autotermination_enabled": false })
}

#[tokio::test]
async fn readiness_times_out_when_the_job_manager_never_comes_up() {
    let dir = tempdir().unwrap();
    let mut store =
        store_in(dir.path(), quiet_config(), json!({ "last_os_boot_time": boot_stamp() }));
    let cloud = FakeCloudPort::new();
    let scheduler = FakeSchedulerPort::new();
    let clock = FakeClock::new();

    // Every invocation burns one readiness attempt.
    let mut saw_timeout_at = None;
    for invocation in 1..=15 {
        let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;
        if store.state().mw_state_set {
            saw_timeout_at = Some((invocation, code));
            break;
        }
        assert_eq!(code, 2, "pending readiness reports a cluster issue");
        assert!(
            store.state().mw_state_counter_value() <= 11,
            "the attempt counter is bounded"
        );
    }

    let (invocation, code) = saw_timeout_at.expect("readiness must time out");
    assert_eq!(code, 0, "the timeout stamp itself succeeds");
    assert_eq!(invocation, 12, "attempts are exhausted after the counter passes its bound");
    assert_eq!(cloud.mw_state_writes(), vec![MwState::Timeout]);

    // Later invocations leave the tag and the counter alone.
    let counter = store.state().mw_state_counter.clone();
    let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;
    assert_eq!(code, 0);
    assert_eq!(cloud.mw_state_writes().len(), 1);
    assert_eq!(store.state().mw_state_counter, counter);
}

#[tokio::test]
async fn cluster_becomes_ready_once_a_worker_registers() {
    let dir = tempdir().unwrap();
    let mut store =
        store_in(dir.path(), quiet_config(), json!({ "last_os_boot_time": boot_stamp() }));
    let cloud = FakeCloudPort::new().with_capacity(cloud_capacity(0, 2, 10, 1, 1));
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_cluster_capacity(cluster_capacity(0, 2, 10));

    // No workers registered yet: not ready, but not an error either.
    let code = run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;
    assert_eq!(code, 0);
    assert!(!store.state().mw_state_set);

    // A worker registered.
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_cluster_capacity(cluster_capacity(1, 2, 10));
    let code = run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;
    assert_eq!(code, 0);
    assert!(store.state().mw_state_set);
    assert_eq!(cloud.mw_state_writes(), vec![MwState::Ready]);
}

#[tokio::test]
async fn readiness_state_survives_a_process_restart() {
    // The counter is persisted: restarting the program (fresh store) keeps
    // counting instead of starting over.
    let dir = tempdir().unwrap();
    let path = cm_storage::test_support::seed_document(
        dir.path(),
        quiet_config(),
        json!({ "last_os_boot_time": boot_stamp() }),
    );
    let cloud = FakeCloudPort::new();
    let scheduler = FakeSchedulerPort::new();

    for expected in 1..=3u32 {
        let mut store = cm_storage::StateStore::load(
            path.clone(),
            &cm_storage::test_support::FakeBootTime(BOOT),
        )
        .unwrap();
        run_invocation(&cloud, &scheduler, &mut store, &FakeClock::new()).await;
        assert_eq!(store.state().mw_state_counter_value(), expected);
    }
}
