//! Elapsed-time tracking since the last fasting breaker.

use crate::ConsumptionEvent;
use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Hours between two instants, negative if `to` precedes `from`
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}

/// Breakers that count at `now`: future-dated events are dropped entirely
fn breakers_until(
    events: &[ConsumptionEvent],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &ConsumptionEvent> {
    events
        .iter()
        .filter(move |e| e.is_fasting_breaker && e.created_at <= now)
}

/// Most recent fasting breaker at or before `now`
pub fn last_breaker(events: &[ConsumptionEvent], now: DateTime<Utc>) -> Option<&ConsumptionEvent> {
    breakers_until(events, now).max_by_key(|e| e.created_at)
}

/// Hours since the last fasting breaker
///
/// Returns `None` if no breaker has ever been logged, which callers must
/// render as an unknown status rather than a zero-length fast.
pub fn compute(events: &[ConsumptionEvent], now: DateTime<Utc>) -> Option<f64> {
    let last = last_breaker(events, now)?;
    let hours = hours_between(last.created_at, now).max(0.0);

    tracing::debug!("Last breaker {} at {}, {:.2}h elapsed", last.id, last.created_at, hours);
    Some(hours)
}

/// A fast bounded by two consecutive breakers
#[derive(Clone, Debug, PartialEq)]
pub struct EndedFast<'a> {
    pub started_by: &'a ConsumptionEvent,
    pub ended_by: &'a ConsumptionEvent,
}

impl EndedFast<'_> {
    pub fn duration_hours(&self) -> f64 {
        hours_between(self.started_by.created_at, self.ended_by.created_at)
    }

    /// Hours between the end of this fast and `now`
    pub fn hours_since_end(&self, now: DateTime<Utc>) -> f64 {
        hours_between(self.ended_by.created_at, now)
    }
}

/// Fasts between consecutive breakers at or before `now`, newest first
///
/// Empty unless at least two breakers exist, since a single breaker says
/// nothing about how long the preceding fast was.
pub fn ended_fasts(events: &[ConsumptionEvent], now: DateTime<Utc>) -> Vec<EndedFast<'_>> {
    let mut breakers: Vec<&ConsumptionEvent> = breakers_until(events, now).collect();
    breakers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    breakers
        .windows(2)
        .map(|pair| EndedFast {
            started_by: pair[1],
            ended_by: pair[0],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(id: &str, at: DateTime<Utc>, breaker: bool) -> ConsumptionEvent {
        ConsumptionEvent {
            id: id.into(),
            created_at: at,
            is_fasting_breaker: breaker,
            category: "meal".into(),
            item_name: "test".into(),
        }
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_no_breaker_is_none() {
        assert_eq!(compute(&[], day(1, 0)), None);

        let hydration_only = vec![event("w", day(1, 8), false)];
        assert_eq!(compute(&hydration_only, day(1, 10)), None);
    }

    #[test]
    fn test_hours_since_latest_breaker() {
        let events = vec![
            event("a", day(1, 8), true),
            event("b", day(1, 20), false),
            event("c", day(3, 8), true),
        ];
        assert_eq!(compute(&events, day(3, 10)), Some(2.0));
    }

    #[test]
    fn test_unordered_feed() {
        let events = vec![event("late", day(2, 12), true), event("early", day(1, 6), true)];
        assert_eq!(compute(&events, day(2, 18)), Some(6.0));
    }

    #[test]
    fn test_future_breaker_is_ignored_not_clamped() {
        let events = vec![
            event("real", day(1, 8), true),
            event("future", day(1, 12) + Duration::minutes(5), true),
        ];
        // Clamping the future event would report 0h; ignoring it reports 4h.
        assert_eq!(compute(&events, day(1, 12)), Some(4.0));
    }

    #[test]
    fn test_breaker_exactly_now() {
        let events = vec![event("now", day(1, 12), true)];
        assert_eq!(compute(&events, day(1, 12)), Some(0.0));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let events = vec![event("a", day(1, 8), true), event("b", day(2, 9), true)];
        let now = day(2, 23);
        assert_eq!(compute(&events, now), compute(&events, now));
    }

    #[test]
    fn test_ended_fasts_newest_first() {
        let events = vec![
            event("c", day(3, 8), true),
            event("a", day(1, 8), true),
            event("w", day(2, 8), false),
            event("b", day(2, 20), true),
        ];
        let fasts = ended_fasts(&events, day(3, 9));
        assert_eq!(fasts.len(), 2);
        assert_eq!(fasts[0].started_by.id, "b");
        assert_eq!(fasts[0].ended_by.id, "c");
        assert_eq!(fasts[0].duration_hours(), 12.0);
        assert_eq!(fasts[0].hours_since_end(day(3, 9)), 1.0);
        assert_eq!(fasts[1].started_by.id, "a");
        assert_eq!(fasts[1].duration_hours(), 36.0);
    }

    #[test]
    fn test_ended_fasts_needs_two_breakers() {
        let events = vec![event("a", day(1, 8), true), event("w", day(1, 9), false)];
        assert!(ended_fasts(&events, day(2, 0)).is_empty());
    }

    #[test]
    fn test_ended_fasts_excludes_future() {
        let events = vec![
            event("a", day(1, 8), true),
            event("b", day(2, 8), true),
            event("future", day(4, 8), true),
        ];
        let fasts = ended_fasts(&events, day(3, 0));
        assert_eq!(fasts.len(), 1);
        assert_eq!(fasts[0].ended_by.id, "b");
    }
}
