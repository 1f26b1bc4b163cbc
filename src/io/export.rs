//! Export the per-run summary table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: every row has the same twelve columns regardless of how the vial's
//! window was obtained.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{RateStats, SampleSummary, SummaryOutcome};
use crate::error::AppError;

/// Header row of the summary CSV.
pub const SUMMARY_HEADER: [&str; 12] = [
    "sample name",
    "trimmed median",
    "trimmed average",
    "trimmed standard deviation",
    "# of cycles included",
    "untrimmed median",
    "untrimmed average",
    "untrimmed standard deviation",
    "total # of cycles in run",
    "Minimum pump events required",
    "Initial window size",
    "Residuals allowed",
];

/// Marker written in place of the parameters when the window was picked by hand.
pub const USER_DEFINED_MARKER: &str = "Defined by user";

/// Write the summary table to `path`.
pub fn write_summary_csv(path: &Path, summaries: &[SampleSummary]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create summary CSV '{}': {e}", path.display())))?;
    write_summary(file, summaries)
}

/// Write the summary table to any writer.
pub fn write_summary<W: Write>(writer: W, summaries: &[SampleSummary]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer
        .write_record(SUMMARY_HEADER)
        .map_err(|e| AppError::io(format!("Failed to write summary CSV header: {e}")))?;

    for summary in summaries {
        writer
            .write_record(summary_record(summary))
            .map_err(|e| AppError::io(format!("Failed to write summary CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush summary CSV: {e}")))?;
    Ok(())
}

/// The twelve fields of one summary row.
pub fn summary_record(summary: &SampleSummary) -> Vec<String> {
    let mut row = Vec::with_capacity(SUMMARY_HEADER.len());
    row.push(summary.sample_name.clone());

    match summary.outcome.trimmed() {
        Some(trimmed) => push_stats(&mut row, trimmed),
        None => row.extend(std::iter::repeat_n("nan".to_string(), 4)),
    }
    push_stats(&mut row, &summary.untrimmed);

    match &summary.outcome {
        SummaryOutcome::Windowed { params, .. } | SummaryOutcome::InsufficientData { params } => {
            row.push(params.min_segments.to_string());
            row.push(params.window_size.to_string());
            row.push(params.residual_tolerance.to_string());
        }
        SummaryOutcome::ManualWindowed { .. } => {
            row.push(USER_DEFINED_MARKER.to_string());
            row.push(String::new());
            row.push(String::new());
        }
    }

    row
}

fn push_stats(row: &mut Vec<String>, stats: &RateStats) {
    row.push(fmt_value(stats.median));
    row.push(fmt_value(stats.mean));
    row.push(fmt_value(stats.std_dev));
    row.push(stats.count.to_string());
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() { "nan".to_string() } else { v.to_string() }
}
