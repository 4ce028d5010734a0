//! CSV export of inferred fast history.
//!
//! Chart tooling downstream reads a plain `date,duration_hours` file.

use crate::{FastDurationSample, Result};
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    duration_hours: String,
}

impl From<&FastDurationSample> for CsvRow {
    fn from(sample: &FastDurationSample) -> Self {
        CsvRow {
            date: sample.date.format("%Y-%m-%d").to_string(),
            duration_hours: format!("{:.2}", sample.duration_hours),
        }
    }
}

/// Write samples as CSV to any writer
///
/// The header row is always written, even for an empty series.
pub fn write_csv<W: Write>(samples: &[FastDurationSample], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(["date", "duration_hours"])?;
    for sample in samples {
        writer.serialize(CsvRow::from(sample))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} history rows as CSV", samples.len());
    Ok(())
}

/// Write samples as CSV to a file, replacing it atomically
pub fn write_csv_file(samples: &[FastDurationSample], path: &Path) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let temp = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    write_csv(samples, temp.as_file())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| crate::Error::Io(e.error))?;

    tracing::info!("Exported {} history rows to {:?}", samples.len(), path);
    Ok(())
}
