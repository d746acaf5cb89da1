// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

#[test]
fn defaults_are_zero_values() {
    let state = StateFields::default();
    assert!(!state.cluster_ready_for_termination);
    assert!(!state.was_mjs_busy);
    assert_eq!(state.mw_state_counter, "0");
    assert_eq!(state.last_os_boot_time, "");
}

#[test]
fn bool_fields_accept_bool_values() {
    let mut state = StateFields::default();
    assert!(state.apply(keys::WAS_MJS_BUSY, &json!(true)));
    assert!(state.was_mjs_busy);
}

#[test]
fn string_fields_accept_string_values() {
    let mut state = StateFields::default();
    assert!(state.apply(keys::MW_STATE_COUNTER, &json!("7")));
    assert_eq!(state.mw_state_counter, "7");
    assert_eq!(state.mw_state_counter_value(), 7);
}

#[parameterized(
    bool_gets_string = { keys::WAS_MJS_BUSY, json!("yes") },
    bool_gets_number = { keys::CLUSTER_AUTO_TERMINATED, json!(1) },
    string_gets_number = { keys::MW_STATE_COUNTER, json!(7) },
    string_gets_bool = { keys::LAST_TERMINATION_POLICY, json!(false) },
    unknown_key = { "no_such_field", json!(true) },
)]
fn mismatched_updates_are_rejected(key: &str, value: serde_json::Value) {
    let mut state = StateFields::default();
    let before = format!("{state:?}");
    assert!(!state.apply(key, &value));
    assert_eq!(format!("{state:?}"), before, "rejected update must not mutate state");
}

#[test]
fn numeric_views_tolerate_garbage() {
    let mut state = StateFields::default();
    state.min_nodes_pre_termination = "not-a-number".into();
    assert_eq!(state.min_nodes_pre_termination_value(), 0);
    state.min_nodes_pre_termination = "3".into();
    assert_eq!(state.min_nodes_pre_termination_value(), 3);
}

#[test]
fn unknown_document_fields_survive_a_round_trip() {
    let raw = json!({
        "config": { "autoscaling_enabled": true, "future_knob": "keep-me" },
        "state": { "was_mjs_busy": true, "future_field": 42 },
    });
    let doc: StateDocument = serde_json::from_value(raw).unwrap();
    let out = serde_json::to_value(&doc).unwrap();
    assert_eq!(out["config"]["future_knob"], "keep-me");
    assert_eq!(out["state"]["future_field"], 42);
}
