//! Default phase and refeed tables.
//!
//! These are the built-in thresholds used when no configuration overrides
//! them. Both tables are plain data and can be replaced from `config.toml`.

use crate::types::*;
use once_cell::sync::Lazy;

/// Version stamped on the built-in tables
pub const DEFAULT_TABLE_VERSION: u32 = 1;

/// Cached default phase table - built once and shared read-only
static DEFAULT_PHASE_TABLE: Lazy<PhaseTable> = Lazy::new(build_default_phase_table);

/// Cached default refeed table
static DEFAULT_REFEED_TABLE: Lazy<RefeedTable> = Lazy::new(build_default_refeed_table);

/// Get a reference to the cached default phase table
pub fn get_default_phase_table() -> &'static PhaseTable {
    &DEFAULT_PHASE_TABLE
}

/// Get a reference to the cached default refeed table
pub fn get_default_refeed_table() -> &'static RefeedTable {
    &DEFAULT_REFEED_TABLE
}

/// Builds the default phase threshold table
///
/// **Note**: prefer `get_default_phase_table()` in production code. This
/// function is kept for config defaults and tests.
pub fn build_default_phase_table() -> PhaseTable {
    let row = |lower_bound_hours: f64, phase: Phase, color: &str, requires_electrolytes: bool| {
        PhaseThreshold {
            lower_bound_hours,
            phase,
            color: color.into(),
            requires_electrolytes,
        }
    };

    PhaseTable {
        version: DEFAULT_TABLE_VERSION,
        thresholds: vec![
            row(0.0, Phase::AnabolicDigestion, "#9ca3af", false),
            row(4.0, Phase::EarlyCatabolic, "#60a5fa", false),
            row(8.0, Phase::FatBurningOnset, "#34d399", false),
            row(12.0, Phase::MildAutophagy, "#a3e635", false),
            row(16.0, Phase::GlycogenDepletion, "#facc15", true),
            row(18.0, Phase::GhrelinPeak, "#fb923c", true),
            row(20.0, Phase::DeepKetosis, "#f97316", true),
            row(24.0, Phase::MaxAutophagy, "#ef4444", true),
            row(48.0, Phase::HepaticCleanse, "#ec4899", true),
            row(72.0, Phase::StemCellRegeneration, "#a855f7", true),
            row(96.0, Phase::DeepTherapeutic, "#6366f1", true),
        ],
    }
}

/// Builds the default refeed protocol table
pub fn build_default_refeed_table() -> RefeedTable {
    let protocol = |id: u32, min_fast_hours_exclusive: f64, monitoring_window_hours: f64| {
        RefeedProtocol {
            id,
            min_fast_hours_exclusive,
            monitoring_window_hours,
        }
    };

    RefeedTable {
        version: DEFAULT_TABLE_VERSION,
        protocols: vec![
            protocol(1, 24.0, 24.0),
            protocol(2, 48.0, 48.0),
            protocol(3, 120.0, 72.0),
            protocol(4, 168.0, 96.0),
        ],
    }
}

impl PhaseTable {
    /// Validate the table invariants
    ///
    /// Returns a list of problems (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let Some(first) = self.thresholds.first() else {
            errors.push("Phase table has no thresholds".to_string());
            return errors;
        };

        if first.lower_bound_hours != 0.0 {
            errors.push(format!(
                "Phase table must start at 0 hours, found {}",
                first.lower_bound_hours
            ));
        }

        for threshold in &self.thresholds {
            if !threshold.lower_bound_hours.is_finite() {
                errors.push(format!(
                    "Phase {:?} has a non-finite lower bound",
                    threshold.phase
                ));
            }
        }

        for pair in self.thresholds.windows(2) {
            if pair[1].lower_bound_hours <= pair[0].lower_bound_hours {
                errors.push(format!(
                    "Phase bounds must be strictly increasing: {:?} ({}) follows {:?} ({})",
                    pair[1].phase,
                    pair[1].lower_bound_hours,
                    pair[0].phase,
                    pair[0].lower_bound_hours
                ));
            }
        }

        errors
    }
}

impl RefeedTable {
    /// Validate the table invariants
    ///
    /// An empty table is valid and disables refeed tracking.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for protocol in &self.protocols {
            if !protocol.min_fast_hours_exclusive.is_finite()
                || protocol.min_fast_hours_exclusive < 0.0
            {
                errors.push(format!(
                    "Refeed protocol {} has an invalid bound {}",
                    protocol.id, protocol.min_fast_hours_exclusive
                ));
            }
            if protocol.monitoring_window_hours.is_nan() || protocol.monitoring_window_hours <= 0.0
            {
                errors.push(format!(
                    "Refeed protocol {} must have a positive monitoring window",
                    protocol.id
                ));
            }
        }

        for pair in self.protocols.windows(2) {
            if pair[1].min_fast_hours_exclusive <= pair[0].min_fast_hours_exclusive {
                errors.push(format!(
                    "Refeed bounds must be strictly ascending: protocol {} follows protocol {}",
                    pair[1].id, pair[0].id
                ));
            }
        }

        errors
    }
}
