//! Elapsed-time and urgency labels. Purely presentational: nothing here
//! takes an order mutably.

use chrono::{DateTime, Duration, Utc};
use shared::domain::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyThresholds {
    pub warning: Duration,
    pub critical: Duration,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            warning: Duration::minutes(10),
            critical: Duration::minutes(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElapsedLabel {
    pub text: String,
    pub urgency: Urgency,
}

/// When the order entered its current status.
pub fn status_since(order: &Order) -> DateTime<Utc> {
    order
        .status_history
        .iter()
        .rev()
        .find(|entry| entry.status == order.status)
        .map(|entry| entry.timestamp)
        .unwrap_or(order.created_at)
}

/// Time since `since`, clamped at zero for references in the future.
pub fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let delta = now.signed_duration_since(since);
    if delta < Duration::zero() {
        Duration::zero()
    } else {
        delta
    }
}

/// `MM:SS` under an hour, `Hh MMm` beyond.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

pub fn urgency(elapsed: Duration, thresholds: &UrgencyThresholds) -> Urgency {
    if elapsed >= thresholds.critical {
        Urgency::Critical
    } else if elapsed >= thresholds.warning {
        Urgency::Warning
    } else {
        Urgency::Normal
    }
}

pub fn elapsed_label(
    since: DateTime<Utc>,
    now: DateTime<Utc>,
    thresholds: &UrgencyThresholds,
) -> ElapsedLabel {
    let elapsed = elapsed(since, now);
    ElapsedLabel {
        text: format_elapsed(elapsed),
        urgency: urgency(elapsed, thresholds),
    }
}

#[cfg(test)]
#[path = "tests/timer_tests.rs"]
mod tests;
