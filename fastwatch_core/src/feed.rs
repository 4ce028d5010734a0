//! Event feed reader.
//!
//! The event log is written by an external store. This module only reads a
//! snapshot of it, either as a JSON array or as JSON Lines, taking a shared
//! lock so a concurrent writer cannot hand us a half-written file.
//!
//! Individual events that fail to parse are skipped with a warning; only a
//! feed that cannot be read at all is an error.

use crate::{ConsumptionEvent, Error, RawConsumptionEvent, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source of consumption events
pub trait EventFeed {
    fn events(&self) -> Result<Vec<ConsumptionEvent>>;
}

/// Feed backed by a JSON or JSONL file on disk
pub struct FileFeed<'a> {
    path: &'a Path,
}

impl<'a> FileFeed<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }
}

impl EventFeed for FileFeed<'_> {
    fn events(&self) -> Result<Vec<ConsumptionEvent>> {
        read_feed(self.path)
    }
}

/// Read all events from a feed file
///
/// A missing file is an empty feed: the user simply has not logged anything.
pub fn read_feed(path: &Path) -> Result<Vec<ConsumptionEvent>> {
    if !path.exists() {
        tracing::info!("No event feed found at {:?}, treating as empty", path);
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let events = parse_feed(&contents)?;
    tracing::debug!("Read {} events from {:?}", events.len(), path);
    Ok(events)
}

/// Parse a feed document
///
/// A document whose first non-whitespace character is `[` is a JSON array;
/// anything else is treated as JSON Lines.
pub fn parse_feed(contents: &str) -> Result<Vec<ConsumptionEvent>> {
    let trimmed = contents.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        parse_json_array(trimmed)
    } else {
        Ok(parse_json_lines(contents))
    }
}

fn parse_json_array(contents: &str) -> Result<Vec<ConsumptionEvent>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(contents)
        .map_err(|e| Error::Feed(format!("Feed is not a valid JSON array: {}", e)))?;

    let mut events = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawConsumptionEvent>(value) {
            Ok(raw) => push_converted(&mut events, raw),
            Err(e) => {
                tracing::warn!("Failed to parse event at index {}: {}", index, e);
            }
        }
    }
    Ok(events)
}

fn parse_json_lines(contents: &str) -> Vec<ConsumptionEvent> {
    let mut events = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RawConsumptionEvent>(line) {
            Ok(raw) => push_converted(&mut events, raw),
            Err(e) => {
                tracing::warn!("Failed to parse event at line {}: {}", line_num + 1, e);
                // Continue reading, don't fail completely
            }
        }
    }

    events
}

fn push_converted(events: &mut Vec<ConsumptionEvent>, raw: RawConsumptionEvent) {
    match ConsumptionEvent::try_from(raw) {
        Ok(event) => events.push(event),
        Err(e) => tracing::warn!("Skipping event: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_json_array() {
        let json = r#"[
            {"id": "a", "created_at": "2024-05-01T08:00:00Z", "is_fasting_breaker": true,
             "category": "meal", "item_name": "Oats"},
            {"id": "b", "created_at": "2024-05-01T09:00:00Z", "is_fasting_breaker": false,
             "category": "hydration", "item_name": "Water"}
        ]"#;

        let events = parse_feed(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].item_name, "Oats");
        assert_eq!(
            events[1].created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
        );
        assert!(!events[1].is_fasting_breaker);
    }

    #[test]
    fn test_bad_timestamp_skips_only_that_event() {
        crate::logging::init_test();
        let json = r#"[
            {"id": "ok", "created_at": "2024-05-01T08:00:00Z", "is_fasting_breaker": true},
            {"id": "bad", "created_at": "someday", "is_fasting_breaker": true},
            {"id": "ok2", "created_at": "2024-05-02T08:00:00Z", "is_fasting_breaker": true}
        ]"#;

        let events = parse_feed(json).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "ok2"]);
    }

    #[test]
    fn test_malformed_array_entry_is_skipped() {
        let json = r#"[
            {"id": "ok", "created_at": "2024-05-01T08:00:00Z", "is_fasting_breaker": true},
            {"created_at": "2024-05-01T08:00:00Z"},
            "not an object"
        ]"#;

        let events = parse_feed(json).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_parse_json_lines_with_corrupt_line() {
        let jsonl = concat!(
            r#"{"id": "1", "created_at": "2024-05-01T08:00:00Z", "is_fasting_breaker": true}"#,
            "\n",
            "{ invalid json }\n",
            "\n",
            r#"{"id": "2", "created_at": "2024-05-02T08:00:00Z", "is_fasting_breaker": true}"#,
            "\n"
        );

        let events = parse_feed(jsonl).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id, "2");
    }

    #[test]
    fn test_truncated_array_is_an_error() {
        let err = parse_feed(r#"[{"id": "1", "created_at": "#).unwrap_err();
        assert!(matches!(err, Error::Feed(_)));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_feed("").unwrap().is_empty());
        assert!(parse_feed("  \n ").unwrap().is_empty());
        assert!(parse_feed("[]").unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_feed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let events = read_feed(&temp_dir.path().join("nope.json")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_file_feed_reads_from_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        std::fs::write(
            &path,
            r#"{"id": "1", "created_at": "2024-05-01T08:00:00Z", "is_fasting_breaker": true}"#,
        )
        .unwrap();

        let events = FileFeed::new(&path).events().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_fasting_breaker);
    }
}
