//! Core domain types for the fasting inference engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Consumption events as they arrive from the event log
//! - Metabolic phases and the threshold tables that map hours to phases
//! - Refeed protocols and the derived refeed countdown
//! - Derived fasting status and historical fast duration samples

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Event Types
// ============================================================================

/// A logged consumption event, owned by the external event store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub is_fasting_breaker: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub item_name: String,
}

/// Wire format of an event, before its timestamp has been parsed
#[derive(Clone, Debug, Deserialize)]
pub struct RawConsumptionEvent {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub is_fasting_breaker: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
}

/// The event store hands out numeric ids in some deployments, strings in others
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl TryFrom<RawConsumptionEvent> for ConsumptionEvent {
    type Error = crate::Error;

    fn try_from(raw: RawConsumptionEvent) -> crate::Result<Self> {
        let created_at = parse_timestamp(&raw.created_at).ok_or_else(|| {
            crate::Error::InvalidEvent {
                id: raw.id.clone(),
                reason: format!("unparseable created_at {:?}", raw.created_at),
            }
        })?;

        Ok(ConsumptionEvent {
            id: raw.id,
            created_at,
            is_fasting_breaker: raw.is_fasting_breaker,
            category: raw.category.unwrap_or_default(),
            item_name: raw.item_name.unwrap_or_default(),
        })
    }
}

/// Parse an ISO-8601 timestamp
///
/// RFC 3339 strings carry their own offset. Timestamps without an offset
/// are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Phase Types
// ============================================================================

/// Metabolic phase of a fast, ordered from shortest to deepest
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AnabolicDigestion,
    EarlyCatabolic,
    FatBurningOnset,
    MildAutophagy,
    GlycogenDepletion,
    GhrelinPeak,
    DeepKetosis,
    MaxAutophagy,
    HepaticCleanse,
    StemCellRegeneration,
    DeepTherapeutic,
}

impl Phase {
    /// Every phase, in order of depth
    pub const ALL: [Phase; 11] = [
        Phase::AnabolicDigestion,
        Phase::EarlyCatabolic,
        Phase::FatBurningOnset,
        Phase::MildAutophagy,
        Phase::GlycogenDepletion,
        Phase::GhrelinPeak,
        Phase::DeepKetosis,
        Phase::MaxAutophagy,
        Phase::HepaticCleanse,
        Phase::StemCellRegeneration,
        Phase::DeepTherapeutic,
    ];

    /// Human-readable phase name shown on the dashboard
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::AnabolicDigestion => "Anabolic/Digestion",
            Phase::EarlyCatabolic => "Early Catabolic",
            Phase::FatBurningOnset => "Fat-Burning Onset",
            Phase::MildAutophagy => "Mild Autophagy",
            Phase::GlycogenDepletion => "Glycogen Depletion",
            Phase::GhrelinPeak => "Ghrelin Peak",
            Phase::DeepKetosis => "Deep Ketosis",
            Phase::MaxAutophagy => "Max Autophagy / Immunity",
            Phase::HepaticCleanse => "Hepatic Cleanse / Euphoria",
            Phase::StemCellRegeneration => "Stem-Cell Regeneration / Skin",
            Phase::DeepTherapeutic => "Deep Therapeutic Fast",
        }
    }

    /// Short guidance text for the phase
    pub fn guidance(self) -> &'static str {
        match self {
            Phase::AnabolicDigestion => "Digesting the last meal; insulin is elevated.",
            Phase::EarlyCatabolic => "Blood sugar normalizes and insulin starts to fall.",
            Phase::FatBurningOnset => "Liver glycogen is being drawn down; fat oxidation rises.",
            Phase::MildAutophagy => "Cellular cleanup begins as insulin stays low.",
            Phase::GlycogenDepletion => {
                "Glycogen stores run low. Take sodium and potassium with water."
            }
            Phase::GhrelinPeak => "Hunger hormones peak and will pass. Keep electrolytes up.",
            Phase::DeepKetosis => "Ketones become a primary fuel. Watch for headaches or cramps.",
            Phase::MaxAutophagy => "Autophagy and immune recycling are near their peak.",
            Phase::HepaticCleanse => "Growth hormone rises and mental clarity often improves.",
            Phase::StemCellRegeneration => "Immune cell turnover and tissue renewal increase.",
            Phase::DeepTherapeutic => {
                "Extended fast territory. Medical supervision is strongly advised."
            }
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One row of the phase threshold table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhaseThreshold {
    pub lower_bound_hours: f64,
    pub phase: Phase,
    pub color: String,
    #[serde(default)]
    pub requires_electrolytes: bool,
}

/// Versioned, ordered phase threshold table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhaseTable {
    #[serde(default = "default_table_version")]
    pub version: u32,
    pub thresholds: Vec<PhaseThreshold>,
}

/// Result of classifying an elapsed duration against a phase table
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PhaseReading {
    /// Position of the matched row in the table
    pub index: usize,
    pub phase: Phase,
    pub phase_name: String,
    pub color: String,
    pub needs_electrolytes: bool,
}

fn default_table_version() -> u32 {
    crate::defaults::DEFAULT_TABLE_VERSION
}

// ============================================================================
// Refeed Types
// ============================================================================

/// A refeed protocol and the fast length it applies to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RefeedProtocol {
    pub id: u32,
    /// The prior fast must be strictly longer than this
    pub min_fast_hours_exclusive: f64,
    pub monitoring_window_hours: f64,
}

/// Versioned refeed protocol table, ascending by bound
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RefeedTable {
    #[serde(default = "default_table_version")]
    pub version: u32,
    pub protocols: Vec<RefeedProtocol>,
}

/// Post-fast refeed countdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RefeedStatus {
    pub protocol_id: u32,
    pub fast_duration_hours: f64,
    pub refeed_hours_left: f64,
    pub total_refeed_window_hours: f64,
}

// ============================================================================
// Status Types
// ============================================================================

/// Whether a fast is currently being tracked
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FastState {
    Active,
    None,
}

/// Derived fasting status, recomputed on every request
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FastingStatus {
    pub status: FastState,
    pub phase: Option<Phase>,
    pub phase_name: Option<String>,
    pub phase_color: Option<String>,
    pub hours_elapsed: Option<f64>,
    pub needs_electrolytes: bool,
    pub refeed_status: Option<RefeedStatus>,
}

impl FastingStatus {
    /// Status for a feed in which no fasting breaker has ever been logged
    pub fn unknown() -> Self {
        Self {
            status: FastState::None,
            phase: None,
            phase_name: None,
            phase_color: None,
            hours_elapsed: None,
            needs_electrolytes: false,
            refeed_status: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FastState::Active
    }
}

// ============================================================================
// History Types
// ============================================================================

/// Longest fast that ended on a given calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FastDurationSample {
    pub date: NaiveDate,
    pub duration_hours: f64,
}

/// Ascending, sparse series of daily samples
pub type FastDurationSeries = Vec<FastDurationSample>;

// ============================================================================
// Formatting
// ============================================================================

/// Format a duration in hours as `"{h}h {mm}m"`, e.g. `"16h 05m"`
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).floor() as u64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, created_at: &str) -> RawConsumptionEvent {
        RawConsumptionEvent {
            id: id.into(),
            created_at: created_at.into(),
            is_fasting_breaker: true,
            category: Some("meal".into()),
            item_name: None,
        }
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_timestamp_as_utc() {
        let parsed = parse_timestamp("2024-03-01T10:00:00.123").unwrap();
        assert_eq!(
            parsed.date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );

        let spaced = parse_timestamp("2024-03-01 10:00:00").unwrap();
        assert_eq!(spaced, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage_timestamp() {
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_raw_event_conversion() {
        let event = ConsumptionEvent::try_from(raw("e1", "2024-03-01T10:00:00Z")).unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(event.category, "meal");
        assert_eq!(event.item_name, "");
        assert!(event.is_fasting_breaker);
    }

    #[test]
    fn test_raw_event_conversion_rejects_bad_timestamp() {
        let err = ConsumptionEvent::try_from(raw("e2", "not a date")).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidEvent { ref id, .. } if id == "e2"));
    }

    #[test]
    fn test_raw_event_accepts_numeric_id() {
        let json = r#"{"id": 42, "created_at": "2024-03-01T10:00:00Z", "is_fasting_breaker": false}"#;
        let raw: RawConsumptionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "42");
        assert!(!raw.is_fasting_breaker);
    }

    #[test]
    fn test_fast_state_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&FastState::Active).unwrap(), "\"ACTIVE\"");
        assert_eq!(serde_json::to_string(&FastState::None).unwrap(), "\"NONE\"");
    }

    #[test]
    fn test_unknown_status_has_no_phase() {
        let status = FastingStatus::unknown();
        assert!(!status.is_active());
        assert!(status.hours_elapsed.is_none());
        assert!(status.phase_name.is_none());
        assert!(!status.needs_electrolytes);
    }

    #[test]
    fn test_phase_order_matches_all() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0.0), "0h 00m");
        assert_eq!(format_hours(16.0833), "16h 04m");
        assert_eq!(format_hours(48.5), "48h 30m");
        assert_eq!(format_hours(-1.0), "0h 00m");
    }
}
