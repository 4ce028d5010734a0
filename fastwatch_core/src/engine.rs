//! Fasting status and history engine.
//!
//! `FastingEngine` owns the phase table, refeed table and gap policy it was
//! built with and answers two stateless requests:
//!
//! 1. **Status**: hours since the last breaker → phase → refeed countdown
//!    for the newest long fast whose monitoring window is still open.
//! 2. **History**: daily fast durations inferred over the whole feed.
//!
//! Nothing is cached between calls; callers poll on their own cadence.

use crate::defaults::{build_default_phase_table, build_default_refeed_table};
use crate::history::{self, GapPolicy};
use crate::{
    elapsed, phase, refeed, Config, ConsumptionEvent, FastDurationSeries, FastState,
    FastingStatus, PhaseTable, RefeedStatus, RefeedTable, Result,
};
use chrono::{DateTime, Local, TimeZone, Utc};

/// Engine configured with immutable threshold tables
#[derive(Clone, Debug)]
pub struct FastingEngine {
    phases: PhaseTable,
    refeed: RefeedTable,
    gap_policy: GapPolicy,
}

impl Default for FastingEngine {
    /// Engine over the built-in tables
    fn default() -> Self {
        Self {
            phases: build_default_phase_table(),
            refeed: build_default_refeed_table(),
            gap_policy: GapPolicy::default(),
        }
    }
}

impl FastingEngine {
    /// Build an engine from explicit tables, rejecting invalid ones
    pub fn new(phases: PhaseTable, refeed: RefeedTable, gap_policy: GapPolicy) -> Result<Self> {
        let config = Config {
            phases,
            refeed,
            history: gap_policy,
            ..Config::default()
        };
        Self::from_config(&config)
    }

    /// Build an engine from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            phases: config.phases.clone(),
            refeed: config.refeed.clone(),
            gap_policy: config.history.clone(),
        })
    }

    pub fn phases(&self) -> &PhaseTable {
        &self.phases
    }

    pub fn refeed_table(&self) -> &RefeedTable {
        &self.refeed
    }

    pub fn gap_policy(&self) -> &GapPolicy {
        &self.gap_policy
    }

    /// Compute the current fasting status
    pub fn status(&self, events: &[ConsumptionEvent], now: DateTime<Utc>) -> FastingStatus {
        let Some(hours_elapsed) = elapsed::compute(events, now) else {
            tracing::debug!("No fasting breaker logged, status unknown");
            return FastingStatus::unknown();
        };

        let Some(reading) = phase::classify(hours_elapsed, &self.phases) else {
            // Unreachable for a validated table
            return FastingStatus::unknown();
        };

        let refeed_status = refeed::active(&self.refeed, &elapsed::ended_fasts(events, now), now);

        tracing::info!(
            "Fasting {:.2}h, phase {:?}, refeed {:?}",
            hours_elapsed,
            reading.phase,
            refeed_status.as_ref().map(|r| r.protocol_id)
        );

        FastingStatus {
            status: FastState::Active,
            phase: Some(reading.phase),
            phase_name: Some(reading.phase_name),
            phase_color: Some(reading.color),
            hours_elapsed: Some(hours_elapsed),
            needs_electrolytes: reading.needs_electrolytes,
            refeed_status,
        }
    }

    /// Refeed selection for a fast of the given length ending now
    pub fn select_refeed(&self, fast_duration_hours: f64) -> Option<RefeedStatus> {
        refeed::select(&self.refeed, fast_duration_hours)
    }

    /// Infer fast history on the local calendar
    pub fn history(&self, events: &[ConsumptionEvent], now: DateTime<Utc>) -> FastDurationSeries {
        self.history_in(events, now, &Local)
    }

    /// Infer fast history on the calendar of `tz`
    pub fn history_in<Tz: TimeZone>(
        &self,
        events: &[ConsumptionEvent],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> FastDurationSeries {
        history::infer_until(events, now, tz, &self.gap_policy)
    }
}
