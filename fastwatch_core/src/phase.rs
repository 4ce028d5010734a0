//! Phase classification.
//!
//! Maps hours elapsed since the last fasting breaker onto the phase table:
//! the matching row is the one with the greatest lower bound that does not
//! exceed the elapsed time. A fast reaching a boundary hour exactly has
//! entered the new phase.

use crate::{PhaseReading, PhaseTable};

/// Classify an elapsed duration against a phase table
///
/// The table is assumed valid (see [`PhaseTable::validate`]); negative or
/// NaN input resolves to the first row. Returns `None` only for an empty
/// table.
pub fn classify(hours_elapsed: f64, table: &PhaseTable) -> Option<PhaseReading> {
    let index = table
        .thresholds
        .partition_point(|t| t.lower_bound_hours <= hours_elapsed)
        .saturating_sub(1);

    let threshold = table.thresholds.get(index)?;

    tracing::debug!(
        "{:.2}h elapsed classified as {:?} (row {})",
        hours_elapsed,
        threshold.phase,
        index
    );

    Some(PhaseReading {
        index,
        phase: threshold.phase,
        phase_name: threshold.phase.display_name().to_string(),
        color: threshold.color.clone(),
        needs_electrolytes: threshold.requires_electrolytes,
    })
}

/// Hours remaining until the next phase begins, if there is one
pub fn hours_to_next_phase(hours_elapsed: f64, table: &PhaseTable) -> Option<f64> {
    table
        .thresholds
        .iter()
        .map(|t| t.lower_bound_hours)
        .find(|&bound| bound > hours_elapsed)
        .map(|bound| bound - hours_elapsed.max(0.0))
}
