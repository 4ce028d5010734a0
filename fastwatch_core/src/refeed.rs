//! Refeed protocol selection.
//!
//! When a long fast ends, the protocol whose bound the fast most recently
//! crossed applies for a fixed monitoring window. Bounds are exclusive: a
//! fast of exactly 24h does not qualify for a "longer than 24h" protocol.

use crate::elapsed::EndedFast;
use crate::{RefeedProtocol, RefeedStatus, RefeedTable};
use chrono::{DateTime, Utc};

/// Find the highest protocol whose bound the fast exceeds
pub fn matching_protocol(table: &RefeedTable, fast_duration_hours: f64) -> Option<&RefeedProtocol> {
    table
        .protocols
        .iter()
        .filter(|p| fast_duration_hours > p.min_fast_hours_exclusive)
        .max_by(|a, b| a.min_fast_hours_exclusive.total_cmp(&b.min_fast_hours_exclusive))
}

/// Select the refeed protocol for a fast that has just ended
///
/// The returned status starts with the full monitoring window left.
pub fn select(table: &RefeedTable, fast_duration_hours: f64) -> Option<RefeedStatus> {
    let protocol = matching_protocol(table, fast_duration_hours)?;

    tracing::debug!(
        "Fast of {:.2}h selects refeed protocol {}",
        fast_duration_hours,
        protocol.id
    );

    Some(RefeedStatus {
        protocol_id: protocol.id,
        fast_duration_hours,
        refeed_hours_left: protocol.monitoring_window_hours,
        total_refeed_window_hours: protocol.monitoring_window_hours,
    })
}

/// Countdown still running at `now` for the newest qualifying fast
///
/// `fasts` must be newest first. Meals logged during a refeed window end
/// short fasts that select nothing, so the scan walks back past them to the
/// long fast that opened the window. It stops once a fast ended longer ago
/// than the widest monitoring window.
pub fn active(
    table: &RefeedTable,
    fasts: &[EndedFast<'_>],
    now: DateTime<Utc>,
) -> Option<RefeedStatus> {
    let horizon = table.longest_window_hours();

    for fast in fasts {
        let since_end = fast.hours_since_end(now);
        if since_end >= horizon {
            break;
        }

        if let Some(status) =
            select(table, fast.duration_hours()).and_then(|s| s.remaining_at(since_end))
        {
            return Some(status);
        }
    }

    None
}

impl RefeedTable {
    /// Widest monitoring window in the table, 0 for an empty table
    pub fn longest_window_hours(&self) -> f64 {
        self.protocols
            .iter()
            .map(|p| p.monitoring_window_hours)
            .fold(0.0, f64::max)
    }
}

impl RefeedStatus {
    /// The countdown `hours_since_fast_ended` after the fast ended
    ///
    /// Returns `None` once the monitoring window has run out.
    pub fn remaining_at(&self, hours_since_fast_ended: f64) -> Option<RefeedStatus> {
        let left = (self.total_refeed_window_hours - hours_since_fast_ended.max(0.0)).max(0.0);
        if left <= 0.0 {
            return None;
        }

        Some(RefeedStatus {
            refeed_hours_left: left,
            ..self.clone()
        })
    }

    /// Fraction of the monitoring window already behind us, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.total_refeed_window_hours <= 0.0 {
            return 1.0;
        }
        (1.0 - self.refeed_hours_left / self.total_refeed_window_hours).clamp(0.0, 1.0)
    }
}
