//! Session report storage
//!
//! One pretty-printed JSON file per report, named `<id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ReportError;
use crate::types::SessionReport;

/// Write `report` into `dir` (created if missing); returns the file path
pub fn save_report(report: &SessionReport, dir: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
    let dir = dir.as_ref();
    let path = dir.join(format!("{}.json", report.id));

    let json = serde_json::to_string_pretty(report)?;
    fs::create_dir_all(dir)?;
    fs::write(&path, json)?;

    info!(path = %path.display(), "session report saved");
    Ok(path)
}

/// Read one report file
pub fn load_report(path: impl AsRef<Path>) -> Result<SessionReport, ReportError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Path of the report called `name` inside `dir`
///
/// Names are file stems made of ASCII letters, digits, `_` and `-`.
pub fn report_path(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf, ReportError> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ReportError::InvalidName(name.to_string()));
    }
    Ok(dir.as_ref().join(format!("{}.json", name)))
}

/// Load the report called `name` from `dir`
pub fn find_report(dir: impl AsRef<Path>, name: &str) -> Result<SessionReport, ReportError> {
    let path = report_path(dir, name)?;
    if !path.is_file() {
        return Err(ReportError::NotFound(name.to_string()));
    }
    load_report(&path)
}

/// One line of the report listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// File stem, usable with [`find_report`]
    pub name: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub score: u32,
    pub total_answered: u32,
}

/// Every readable report in `dir`, newest first
pub fn list_reports(dir: impl AsRef<Path>) -> Result<Vec<ReportSummary>, ReportError> {
    let mut summaries = Vec::new();
    for path in reports_by_mtime(dir.as_ref())? {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        match load_report(&path) {
            Ok(report) => summaries.push(ReportSummary {
                name,
                topic: report.topic,
                created_at: report.created_at,
                score: report.score,
                total_answered: report.total_answered,
            }),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable report"),
        }
    }
    Ok(summaries)
}

/// Most recently modified report in `dir`, if any
///
/// Files that are not `.json`, cannot be inspected or fail to parse are skipped.
pub fn latest_report(dir: impl AsRef<Path>) -> Result<Option<SessionReport>, ReportError> {
    for path in reports_by_mtime(dir.as_ref())? {
        match load_report(&path) {
            Ok(report) => return Ok(Some(report)),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable report"),
        }
    }
    Ok(None)
}

/// `.json` files in `dir`, newest modification first; empty for a missing dir
fn reports_by_mtime(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => candidates.push((modified, path)),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping uninspectable report"),
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(candidates.into_iter().map(|(_, path)| path).collect())
}
