//! Experiment export as JSON or CSV
//!
//! JSON mirrors the [`Experiment`] shape (camelCase, responses inline).
//! CSV has one row per response with a fixed column order.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::experiment::Experiment;
use crate::{Error, Result};

/// CSV header row.
pub const CSV_HEADERS: [&str; 12] = [
    "ID",
    "Temperature",
    "Top P",
    "Model",
    "Response Text",
    "Coherence",
    "Completeness",
    "Structural",
    "Overall",
    "Response Time (ms)",
    "Token Count",
    "Created At",
];

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed JSON document
    #[default]
    Json,
    /// Comma-separated rows
    Csv,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// MIME type of the rendered document.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::Validation(format!("Unknown export format: {other}"))),
        }
    }
}

/// Download file name, `experiment-<id>.<ext>`.
#[must_use]
pub fn file_name(experiment_id: &str, format: ExportFormat) -> String {
    format!("experiment-{experiment_id}.{}", format.extension())
}

/// Render an experiment as pretty JSON.
///
/// # Errors
///
/// Returns `Error::Serialization` if encoding fails.
pub fn to_json(experiment: &Experiment) -> Result<String> {
    Ok(serde_json::to_string_pretty(experiment)?)
}

/// Render an experiment's responses as CSV, header first.
///
/// # Errors
///
/// Returns `Error::Csv` if a row cannot be written.
pub fn to_csv(experiment: &Experiment) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(experiment, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Validation(e.to_string()))
}

/// Stream CSV rows into any writer.
///
/// # Errors
///
/// Returns `Error::Csv` on a write failure.
pub fn write_csv<W: Write>(experiment: &Experiment, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);

    wtr.write_record(CSV_HEADERS)?;
    for r in experiment.responses() {
        let metrics = r.metrics();
        wtr.write_record([
            r.id().to_string(),
            r.temperature().to_string(),
            r.top_p().to_string(),
            r.model().to_string(),
            r.response_text().to_string(),
            metrics.coherence().to_string(),
            metrics.completeness().to_string(),
            metrics.structural().to_string(),
            metrics.overall().to_string(),
            r.response_time_ms().to_string(),
            r.token_count().to_string(),
            r.created_at().to_rfc3339_opts(SecondsFormat::Millis, true),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `experiment` into `dir` under its [`file_name`].
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be written, or a rendering error.
pub fn write_to_dir(
    experiment: &Experiment,
    format: ExportFormat,
    dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let path = dir.as_ref().join(file_name(experiment.id(), format));
    let body = match format {
        ExportFormat::Json => to_json(experiment)?,
        ExportFormat::Csv => to_csv(experiment)?,
    };
    fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("abc", ExportFormat::Csv), "experiment-abc.csv");
        assert_eq!(file_name("abc", ExportFormat::Json), "experiment-abc.json");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" json ".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!("xml".parse::<ExportFormat>(), Err(Error::Validation(_))));
        assert_eq!(ExportFormat::default(), ExportFormat::Json);
        assert_eq!(ExportFormat::Csv.content_type(), "text/csv");
    }

    #[test]
    fn test_empty_experiment_csv_is_header_only() {
        let experiment = Experiment::new("exp-1", "prompt text");
        let csv = to_csv(&experiment).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert_eq!(
            csv.trim_end(),
            "ID,Temperature,Top P,Model,Response Text,Coherence,Completeness,Structural,\
             Overall,Response Time (ms),Token Count,Created At"
        );
    }
}
