// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination scenarios: on-idle tear-down and on-schedule setup.

use crate::prelude::*;

#[tokio::test]
async fn on_idle_termination_tears_the_cluster_down() {
    // The scheduler has been idle for 20 minutes against a 10 minute
    // timeout: the same invocation marks the cluster, tears it down, and
    // requests the head-node shutdown.
    let dir = tempdir().unwrap();
    let log = dir.path().join("mjs_status.log");
    std::fs::write(&log, "MJS busy\nMJS idle since: 2025-01-02 11:40:00 UTC\n").unwrap();
    let mut store = store_in(
        dir.path(),
        json!({
            "autoscaling_enabled": false,
            "autotermination_enabled": true,
            "initial_termination_policy": "never",
            "mjs_status_log_file": log,
        }),
        json!({ "last_os_boot_time": boot_stamp(), "mw_state_set": true }),
    );
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(1, 2, 10, 2, 2))
        .with_idle_timeout_seconds(600)
        .with_termination_policy(TerminationPolicy::OnIdle);
    let scheduler = FakeSchedulerPort::new()
        .running()
        .with_registered_nodes(["h1", "h2"]);
    let clock = clock_at(2025, 1, 2, 12, 0, 0);

    let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;

    assert_eq!(code, 0);
    // The log scan set was_mjs_busy during load, so the tag timeout ruled.
    assert!(store.state().cluster_ready_for_termination);
    assert!(store.state().cluster_auto_terminated);
    // Tear-down: minimum recorded and zeroed, everything drained and
    // unprotected, services stopped in order, host shut down.
    assert_eq!(store.state().min_nodes_pre_termination, "1");
    assert_eq!(cloud.min_nodes_calls(), vec![0]);
    assert_eq!(cloud.desired_capacity_calls(), vec![0]);
    assert_eq!(scheduler.drained_hosts(), hosts(["h1", "h2"]));
    assert_eq!(cloud.unprotected_hosts(), hosts(["h1", "h2"]));
    assert_eq!(scheduler.op_log(), vec!["stop_job_manager", "stop_mjs", "shutdown"]);
    assert!(!log.exists());
    // The policy tag was reset to the initial choice.
    assert_eq!(cloud.policy_writes().last().unwrap().as_tag_value(), "never");
    assert_eq!(store.state().last_termination_policy, "never");
}

#[tokio::test]
async fn on_idle_within_the_timeout_leaves_the_cluster_alone() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("mjs_status.log");
    std::fs::write(&log, "MJS busy\nMJS idle since: 2025-01-02 11:55:00 UTC\n").unwrap();
    let mut store = store_in(
        dir.path(),
        json!({
            "autoscaling_enabled": false,
            "autotermination_enabled": true,
            "mjs_status_log_file": log,
        }),
        json!({ "last_os_boot_time": boot_stamp(), "mw_state_set": true }),
    );
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 2, 10, 2, 2))
        .with_idle_timeout_seconds(600)
        .with_termination_policy(TerminationPolicy::OnIdle);
    let scheduler = FakeSchedulerPort::new().running();
    let clock = clock_at(2025, 1, 2, 12, 0, 0);

    let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;

    assert_eq!(code, 0);
    assert!(!store.state().cluster_ready_for_termination);
    assert_eq!(scheduler.shutdown_calls(), 0);
}

#[tokio::test]
async fn on_schedule_setup_stamps_the_deadline() {
    // Tag `After 2 hours` at 10:00 becomes a fixed noon deadline on the
    // tag; nothing terminates this tick.
    let dir = tempdir().unwrap();
    let mut store = store_in(
        dir.path(),
        json!({ "autoscaling_enabled": false, "autotermination_enabled": true }),
        json!({ "last_os_boot_time": boot_stamp(), "mw_state_set": true }),
    );
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 2, 10, 2, 2))
        .with_termination_policy(TerminationPolicy::AfterHours(2));
    let scheduler = FakeSchedulerPort::new().running();
    let clock = clock_at(2025, 1, 2, 10, 0, 0);

    let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;

    assert_eq!(code, 0);
    let writes = cloud.policy_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].as_tag_value(), "Thu, 02 Jan 2025 12:00:00 GMT");
    assert!(!store.state().cluster_ready_for_termination);
    assert_eq!(scheduler.shutdown_calls(), 0);
    // The raw tag value is backed up for the next invocation.
    assert_eq!(store.state().last_termination_policy, "After 2 hours");
}

#[tokio::test]
async fn stamped_deadline_terminates_once_reached() {
    let dir = tempdir().unwrap();
    let mut store = store_in(
        dir.path(),
        json!({
            "autoscaling_enabled": false,
            "autotermination_enabled": true,
            "initial_termination_policy": "never",
        }),
        json!({
            "last_os_boot_time": boot_stamp(),
            "mw_state_set": true,
            "last_termination_policy": "Thu, 02 Jan 2025 12:00:00 GMT",
        }),
    );
    let deadline = TerminationPolicy::parse("Thu, 02 Jan 2025 12:00:00 GMT").unwrap();
    let cloud = FakeCloudPort::new()
        .with_capacity(cloud_capacity(0, 0, 10, 0, 2))
        .with_termination_policy(deadline);
    let scheduler = FakeSchedulerPort::new().running();
    let clock = clock_at(2025, 1, 2, 12, 30, 0);

    let code = run_invocation(&cloud, &scheduler, &mut store, &clock).await;

    assert_eq!(code, 0);
    assert!(store.state().cluster_auto_terminated);
    assert_eq!(scheduler.shutdown_calls(), 1);
}
