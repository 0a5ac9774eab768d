//! CSV ingestion for the runner.
//!
//! This is the only place indicator names are matched. Column headers must be
//! an indicator id or its source column code, exactly (after trimming).
//! Anything the engine cannot use is rejected or dropped here, with a warning
//! for every row or cell that is coerced.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use leadlab_core::domain::{
    IndicatorId, IndicatorObservation, RecessionError, RecessionInterval, RecessionTable,
    WeightMap,
};

use crate::config::DataConfig;
use crate::forecasts::ForecastField;
use crate::weights::WeightSubmission;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path}: first column must be '{expected}', found '{found}'")]
    MissingColumn {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("{path}: unknown indicator column '{header}'")]
    UnknownIndicator { path: PathBuf, header: String },

    #[error("{path}: indicator column '{header}' appears twice")]
    DuplicateColumn { path: PathBuf, header: String },

    #[error("{path}: invalid recession table: {source}")]
    Recessions {
        path: PathBuf,
        source: RecessionError,
    },
}

/// Observations and recessions for one analysis, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedData {
    pub observations: Vec<IndicatorObservation>,
    pub recessions: RecessionTable,
    /// BLAKE3 over every loaded date and value, for run fingerprints.
    pub dataset_hash: String,
}

/// Load both input files named in `[data]`.
pub fn load_data(config: &DataConfig) -> Result<LoadedData, LoadError> {
    let observations = load_observations(&config.observations)?;
    let recessions = load_recessions(&config.recessions)?;
    let dataset_hash = compute_dataset_hash(&observations, &recessions);
    Ok(LoadedData {
        observations,
        recessions,
        dataset_hash,
    })
}

pub fn load_observations(path: &Path) -> Result<Vec<IndicatorObservation>, LoadError> {
    let reader = open(path)?;
    read_observations(reader, path)
}

pub fn load_recessions(path: &Path) -> Result<RecessionTable, LoadError> {
    let reader = open(path)?;
    read_recessions(reader, path)
}

pub fn load_submissions(path: &Path) -> Result<Vec<WeightSubmission>, LoadError> {
    let reader = open(path)?;
    read_submissions(reader, path)
}

/// Parse an observations CSV: `date` followed by indicator columns.
///
/// Empty cells are absent values. Cells that fail to parse become 0.
/// Rows whose date cannot be parsed are dropped.
pub fn read_observations<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<Vec<IndicatorObservation>, LoadError> {
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let columns = indicator_columns(&headers, "date", path)?;

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let raw_date = record.get(0).unwrap_or_default();
        let Some(date) = parse_date(raw_date) else {
            warn!(path = %path.display(), row, date = raw_date, "dropping row with unparseable date");
            continue;
        };

        let mut obs = IndicatorObservation::new(date);
        for (col, id) in &columns {
            let cell = record.get(*col).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            obs = obs.with(*id, parse_number(cell, path, row, id.as_str()));
        }
        observations.push(obs);
    }

    debug!(path = %path.display(), rows = observations.len(), indicators = columns.len(), "loaded observations");
    Ok(observations)
}

/// Parse a recessions CSV with `start` and `end` columns (any case, any order).
///
/// Rows missing either date are dropped. The result must form a valid table.
pub fn read_recessions<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<RecessionTable, LoadError> {
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                expected: name,
                found: headers.iter().collect::<Vec<_>>().join(","),
            })
    };
    let start_col = find("start")?;
    let end_col = find("end")?;

    let mut intervals = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let start = record.get(start_col).and_then(parse_date);
        let end = record.get(end_col).and_then(parse_date);
        match (start, end) {
            (Some(start), Some(end)) => intervals.push(RecessionInterval::new(start, end)),
            _ => warn!(path = %path.display(), row, "dropping recession row without both dates"),
        }
    }

    let table = RecessionTable::new(intervals).map_err(|source| LoadError::Recessions {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), recessions = table.len(), "loaded recessions");
    Ok(table)
}

/// A column on a submissions sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SubmissionColumn {
    Weight(IndicatorId),
    Forecast(ForecastField),
}

/// Parse a submissions CSV: `submitter` followed by indicator weight columns
/// and any of the forecast columns (`GDP_12Month`, `GDP_24Month`,
/// `Recession_Probability`).
///
/// Blank or unparseable cells count as 0.
pub fn read_submissions<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<Vec<WeightSubmission>, LoadError> {
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let columns = submission_columns(&headers, path)?;

    let mut submissions = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let mut submission = WeightSubmission {
            submitter: record.get(0).unwrap_or_default().trim().to_string(),
            weights: WeightMap::new(),
            forecasts: Default::default(),
        };
        for (col, column) in &columns {
            let cell = record.get(*col).unwrap_or_default().trim();
            match *column {
                SubmissionColumn::Weight(id) => {
                    let weight = if cell.is_empty() {
                        0.0
                    } else {
                        parse_number(cell, path, row, id.as_str())
                    };
                    submission.weights.set(id, weight);
                }
                SubmissionColumn::Forecast(field) => {
                    let value = if cell.is_empty() {
                        0.0
                    } else {
                        parse_number(cell, path, row, field.as_str())
                    };
                    submission.forecasts.insert(field, value);
                }
            }
        }
        submissions.push(submission);
    }

    debug!(path = %path.display(), submissions = submissions.len(), "loaded weight submissions");
    Ok(submissions)
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM` (first of month) and `M/D/YYYY`.
///
/// Two-digit years in the slash form pivot at 50: `51..=99` map to 19xx and
/// `00..=50` to 20xx.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = s.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() <= 2 {
        year += if year > 50 { 1900 } else { 2000 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Open a CSV with trimmed fields and flexible row lengths.
fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| csv_error(path, e))
}

fn expect_first_column(
    headers: &csv::StringRecord,
    first: &'static str,
    path: &Path,
) -> Result<(), LoadError> {
    let found = headers.get(0).unwrap_or_default().trim();
    if found.eq_ignore_ascii_case(first) {
        Ok(())
    } else {
        Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            expected: first,
            found: found.to_string(),
        })
    }
}

/// Map every column after the first to an indicator id.
fn indicator_columns(
    headers: &csv::StringRecord,
    first: &'static str,
    path: &Path,
) -> Result<Vec<(usize, IndicatorId)>, LoadError> {
    expect_first_column(headers, first, path)?;

    let mut columns: Vec<(usize, IndicatorId)> = Vec::new();
    for (col, header) in headers.iter().enumerate().skip(1) {
        let id = IndicatorId::from_name(header).ok_or_else(|| LoadError::UnknownIndicator {
            path: path.to_path_buf(),
            header: header.to_string(),
        })?;
        if columns.iter().any(|(_, seen)| *seen == id) {
            return Err(LoadError::DuplicateColumn {
                path: path.to_path_buf(),
                header: header.to_string(),
            });
        }
        columns.push((col, id));
    }
    Ok(columns)
}

/// Map every column after `submitter` to a weight or a forecast.
fn submission_columns(
    headers: &csv::StringRecord,
    path: &Path,
) -> Result<Vec<(usize, SubmissionColumn)>, LoadError> {
    expect_first_column(headers, "submitter", path)?;

    let mut columns: Vec<(usize, SubmissionColumn)> = Vec::new();
    for (col, header) in headers.iter().enumerate().skip(1) {
        let column = ForecastField::from_name(header)
            .map(SubmissionColumn::Forecast)
            .or_else(|| IndicatorId::from_name(header).map(SubmissionColumn::Weight))
            .ok_or_else(|| LoadError::UnknownIndicator {
                path: path.to_path_buf(),
                header: header.to_string(),
            })?;
        if columns.iter().any(|(_, seen)| *seen == column) {
            return Err(LoadError::DuplicateColumn {
                path: path.to_path_buf(),
                header: header.to_string(),
            });
        }
        columns.push((col, column));
    }
    Ok(columns)
}

fn parse_number(cell: &str, path: &Path, row: usize, column: &str) -> f64 {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            warn!(path = %path.display(), row, column, cell, "unparseable value, using 0");
            0.0
        }
    }
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Compute a deterministic BLAKE3 hash over all loaded data.
///
/// Observations are hashed in file order with their values in canonical
/// indicator order, then every recession interval.
pub fn compute_dataset_hash(
    observations: &[IndicatorObservation],
    recessions: &RecessionTable,
) -> String {
    let mut hasher = blake3::Hasher::new();

    for obs in observations {
        hasher.update(obs.date.to_string().as_bytes());
        for (id, value) in &obs.values {
            hasher.update(id.as_str().as_bytes());
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.update(b"recessions");
    for r in recessions {
        hasher.update(r.start.to_string().as_bytes());
        hasher.update(r.end.to_string().as_bytes());
    }

    hasher.finalize().to_hex().to_string()
}
