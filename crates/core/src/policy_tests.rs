// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    never = { "never" },
    never_upper = { "NEVER" },
    on_idle = { "on_idle" },
    on_idle_mixed = { "On_Idle" },
)]
fn keyword_policies_are_case_insensitive(raw: &str) {
    let policy = TerminationPolicy::parse(raw).unwrap();
    assert!(matches!(policy, TerminationPolicy::Never | TerminationPolicy::OnIdle));
}

#[parameterized(
    two = { "After 2 hours", 2 },
    one = { "After 1 hour", 1 },
    lower = { "after 24 hours", 24 },
    shouty = { "AFTER 12 HOURS", 12 },
)]
fn after_hours_forms(raw: &str, hours: u8) {
    assert_eq!(TerminationPolicy::parse(raw), Some(TerminationPolicy::AfterHours(hours)));
}

#[parameterized(
    empty = { "" },
    zero_hours = { "After 0 hours" },
    too_many = { "After 25 hours" },
    three_digits = { "After 100 hours" },
    missing_unit = { "After 3" },
    wrong_unit = { "After 3 days" },
    garbage = { "whenever" },
    bad_date = { "Foo, 99 Bar 2025 99:99:99 GMT" },
)]
fn invalid_forms_are_rejected(raw: &str) {
    assert_eq!(TerminationPolicy::parse(raw), None);
}

#[test]
fn rfc1123_timestamps_parse_to_utc() {
    let policy = TerminationPolicy::parse("Thu, 02 Jan 2025 12:00:00 GMT").unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    assert_eq!(policy, TerminationPolicy::At(expected));
}

#[test]
fn timestamp_tag_value_round_trips() {
    let instant = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let policy = TerminationPolicy::At(instant);
    assert_eq!(policy.as_tag_value(), "Thu, 02 Jan 2025 12:00:00 GMT");
    assert_eq!(TerminationPolicy::parse(&policy.as_tag_value()), Some(policy));
}

proptest! {
    /// Every canonical tag value must parse back to the policy it came from.
    #[test]
    fn canonical_forms_round_trip(hours in 1u8..=24, secs in 0i64..4_102_444_800) {
        let cases = [
            TerminationPolicy::Never,
            TerminationPolicy::OnIdle,
            TerminationPolicy::AfterHours(hours),
            TerminationPolicy::At(Utc.timestamp_opt(secs, 0).unwrap()),
        ];
        for policy in cases {
            prop_assert_eq!(TerminationPolicy::parse(&policy.as_tag_value()), Some(policy));
        }
    }
}
