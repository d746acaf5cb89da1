// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination policy carried by the `mw-autoshutdown` head-node tag.

use chrono::{DateTime, Utc};
use std::fmt;

/// RFC-1123 timestamp layout used when stamping a schedule on the tag.
const RFC1123_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parsed value of the `mw-autoshutdown` tag.
///
/// Accepted tag forms are `never`, `on_idle` (both case-insensitive),
/// `After N hours` with 1 <= N <= 24, or an RFC-1123 timestamp with a
/// trailing zone name. Anything else is invalid and treated as an absent
/// tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// The cluster is never terminated automatically.
    Never,
    /// Terminate once the scheduler has been idle past the timeout.
    OnIdle,
    /// Terminate a fixed number of hours from the next policy evaluation.
    AfterHours(u8),
    /// Terminate once the given instant has passed.
    At(DateTime<Utc>),
}

impl TerminationPolicy {
    /// Parse and normalize a raw tag value. Returns `None` when the value is
    /// empty or not one of the accepted forms.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("never") {
            return Some(TerminationPolicy::Never);
        }
        if trimmed.eq_ignore_ascii_case("on_idle") {
            return Some(TerminationPolicy::OnIdle);
        }
        if let Some(hours) = parse_after_hours(trimmed) {
            return Some(TerminationPolicy::AfterHours(hours));
        }
        if let Ok(instant) = DateTime::parse_from_rfc2822(trimmed) {
            return Some(TerminationPolicy::At(instant.with_timezone(&Utc)));
        }
        None
    }

    /// Canonical tag value for this policy.
    pub fn as_tag_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationPolicy::Never => f.write_str("never"),
            TerminationPolicy::OnIdle => f.write_str("on_idle"),
            TerminationPolicy::AfterHours(1) => f.write_str("After 1 hour"),
            TerminationPolicy::AfterHours(hours) => write!(f, "After {hours} hours"),
            TerminationPolicy::At(instant) => write!(f, "{}", instant.format(RFC1123_GMT)),
        }
    }
}

/// Parse the `After N hours` form, case-insensitively. N is limited to one
/// or two digits and the 1..=24 range.
fn parse_after_hours(raw: &str) -> Option<u8> {
    let rest = raw
        .get(..6)
        .filter(|prefix| prefix.eq_ignore_ascii_case("after "))
        .map(|_| &raw[6..])?;
    let (digits, unit) = rest.split_once(' ')?;
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u8 = digits.parse().ok()?;
    if !(1..=24).contains(&hours) {
        return None;
    }
    let unit_ok = unit.eq_ignore_ascii_case("hour") || unit.eq_ignore_ascii_case("hours");
    unit_ok.then_some(hours)
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
