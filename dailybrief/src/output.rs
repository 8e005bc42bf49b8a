use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// Coarse half-day label derived from the run's UTC hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Evening,
}

impl TimeSlot {
    /// Morning before 12:00 UTC, evening from 12:00 on.
    pub fn from_utc_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeSlot::Morning
        } else {
            TimeSlot::Evening
        }
    }

    pub fn from_datetime(now: DateTime<Utc>) -> Self {
        Self::from_utc_hour(now.hour())
    }

    /// File-name suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Evening => "evening",
        }
    }

    /// Title label
    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Evening => "Evening",
        }
    }
}

/// Offset used for human-readable timestamps; out-of-range values fall back to UTC.
pub fn display_offset(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// `YYYY-MM-DD.md`, or `YYYY-MM-DD-{slot}.md` when a slot is given.
pub fn report_file_name(date: NaiveDate, slot: Option<TimeSlot>) -> String {
    match slot {
        Some(slot) => format!("{}-{}.md", date.format("%Y-%m-%d"), slot.as_str()),
        None => format!("{}.md", date.format("%Y-%m-%d")),
    }
}

/// Write the report into `dir`, creating the directory when missing.
/// Any failure here is fatal for the run.
pub async fn write_report(dir: &Path, file_name: &str, markdown: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, markdown)
        .await
        .with_context(|| format!("failed to write report {}", path.display()))?;

    let size = tokio::fs::metadata(&path)
        .await
        .map(|m| m.len())
        .unwrap_or(markdown.len() as u64);
    info!(path = %path.display(), size_kb = %format!("{:.2}", size as f64 / 1024.0), "report written");

    Ok(path)
}
