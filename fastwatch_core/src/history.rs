//! Historical fast duration inference.
//!
//! Fasts are never logged as start/end pairs. They are reconstructed from
//! the gaps between consecutive fasting breakers, and each gap is credited
//! to the local calendar day on which it ended. Only the longest fast per
//! day is kept, so the resulting series is sparse.

use crate::elapsed::hours_between;
use crate::{ConsumptionEvent, FastDurationSample, FastDurationSeries};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gap window that counts as a real fast
///
/// Shorter gaps are the same eating episode; longer ones are missing data.
/// Both bounds are inclusive.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GapPolicy {
    #[serde(default = "default_min_gap_hours")]
    pub min_gap_hours: f64,

    #[serde(default = "default_max_gap_hours")]
    pub max_gap_hours: f64,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            min_gap_hours: default_min_gap_hours(),
            max_gap_hours: default_max_gap_hours(),
        }
    }
}

fn default_min_gap_hours() -> f64 {
    4.0
}

fn default_max_gap_hours() -> f64 {
    168.0
}

impl GapPolicy {
    pub fn accepts(&self, gap_hours: f64) -> bool {
        gap_hours >= self.min_gap_hours && gap_hours <= self.max_gap_hours
    }

    /// Returns a list of problems (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.min_gap_hours.is_finite() || self.min_gap_hours < 0.0 {
            errors.push(format!("Invalid min_gap_hours {}", self.min_gap_hours));
        }
        if !self.max_gap_hours.is_finite() || self.max_gap_hours < self.min_gap_hours {
            errors.push(format!(
                "max_gap_hours {} must be at least min_gap_hours {}",
                self.max_gap_hours, self.min_gap_hours
            ));
        }
        errors
    }
}

/// Infer daily fast durations using the local calendar
pub fn infer(events: &[ConsumptionEvent]) -> FastDurationSeries {
    infer_in(events, &Local)
}

/// Infer daily fast durations using the calendar of `tz`
pub fn infer_in<Tz: TimeZone>(events: &[ConsumptionEvent], tz: &Tz) -> FastDurationSeries {
    infer_with(events, tz, &GapPolicy::default())
}

/// Infer daily fast durations, ignoring events after `now`
pub fn infer_until<Tz: TimeZone>(
    events: &[ConsumptionEvent],
    now: DateTime<Utc>,
    tz: &Tz,
    policy: &GapPolicy,
) -> FastDurationSeries {
    let current: Vec<ConsumptionEvent> = events
        .iter()
        .filter(|e| e.created_at <= now)
        .cloned()
        .collect();

    let skipped = events.len() - current.len();
    if skipped > 0 {
        tracing::warn!("Ignoring {} future-dated events in history", skipped);
    }

    infer_with(&current, tz, policy)
}

/// Infer daily fast durations with an explicit gap policy
pub fn infer_with<Tz: TimeZone>(
    events: &[ConsumptionEvent],
    tz: &Tz,
    policy: &GapPolicy,
) -> FastDurationSeries {
    let mut breakers: Vec<&ConsumptionEvent> =
        events.iter().filter(|e| e.is_fasting_breaker).collect();
    breakers.sort_by_key(|e| e.created_at);

    // BTreeMap keeps the output ascending by date
    let mut best_per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut discarded = 0usize;

    for pair in breakers.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let gap_hours = hours_between(prev.created_at, curr.created_at);

        if !policy.accepts(gap_hours) {
            discarded += 1;
            continue;
        }

        let date = curr.created_at.with_timezone(tz).date_naive();
        best_per_day
            .entry(date)
            .and_modify(|best| *best = best.max(gap_hours))
            .or_insert(gap_hours);
    }

    tracing::debug!(
        "Inferred {} daily samples from {} breakers ({} gaps discarded)",
        best_per_day.len(),
        breakers.len(),
        discarded
    );

    best_per_day
        .into_iter()
        .map(|(date, duration_hours)| FastDurationSample {
            date,
            duration_hours,
        })
        .collect()
}

/// Time-range filter applied to an inferred series
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRange {
    Week,
    Month,
    Year,
    All,
}

impl HistoryRange {
    /// Number of days covered, counting today
    pub fn days(self) -> Option<i64> {
        match self {
            HistoryRange::Week => Some(7),
            HistoryRange::Month => Some(30),
            HistoryRange::Year => Some(365),
            HistoryRange::All => None,
        }
    }

    /// Keep samples dated within the range ending on `today`
    pub fn filter(self, samples: &[FastDurationSample], today: NaiveDate) -> FastDurationSeries {
        let Some(days) = self.days() else {
            return samples.to_vec();
        };
        let first_day = today - Duration::days(days - 1);

        samples
            .iter()
            .filter(|s| s.date >= first_day && s.date <= today)
            .cloned()
            .collect()
    }
}

impl std::str::FromStr for HistoryRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "week" | "7d" => Ok(HistoryRange::Week),
            "month" | "30d" => Ok(HistoryRange::Month),
            "year" | "365d" => Ok(HistoryRange::Year),
            "all" => Ok(HistoryRange::All),
            other => Err(crate::Error::Other(format!("Unknown history range: {}", other))),
        }
    }
}

/// Headline numbers for a series
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistorySummary {
    pub fast_count: usize,
    pub longest_hours: Option<f64>,
    pub average_hours: Option<f64>,
}

impl HistorySummary {
    pub fn from_samples(samples: &[FastDurationSample]) -> Self {
        let fast_count = samples.len();
        let longest_hours = samples
            .iter()
            .map(|s| s.duration_hours)
            .max_by(|a, b| a.total_cmp(b));
        let average_hours = (fast_count > 0).then(|| {
            samples.iter().map(|s| s.duration_hours).sum::<f64>() / fast_count as f64
        });

        Self {
            fast_count,
            longest_hours,
            average_hours,
        }
    }
}
