//! Run manifest JSON.
//!
//! The manifest is a diagnostic dump of one analysis run: which files were
//! read, how many segments each vial produced or lost, how many review rounds
//! it took, and the final summary record.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::SampleSummary;
use crate::error::AppError;

/// Per-vial diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct VialRecord {
    pub vial: u32,
    pub od_trace: PathBuf,
    pub dilution_log: PathBuf,
    pub readings: usize,
    pub dilutions: usize,
    pub segments_fitted: usize,
    pub segments_dropped: usize,
    pub review_rounds: usize,
    pub figure: Option<PathBuf>,
    pub summary: SampleSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Local>,
    pub data_dir: PathBuf,
    pub summary_csv: PathBuf,
    pub vials: Vec<VialRecord>,
}

impl RunManifest {
    pub fn new(data_dir: &Path, summary_csv: &Path, vials: Vec<VialRecord>) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Local::now(),
            data_dir: data_dir.to_path_buf(),
            summary_csv: summary_csv.to_path_buf(),
            vials,
        }
    }
}

/// Write a manifest JSON file.
pub fn write_manifest_json(path: &Path, manifest: &RunManifest) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create manifest JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| AppError::io(format!("Failed to write manifest JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RateStats, SummaryOutcome, WindowParams};

    #[test]
    fn manifest_json_carries_vial_diagnostics() {
        let summary = SampleSummary {
            sample_name: "wt".to_string(),
            vial: 5,
            untrimmed: RateStats::empty(),
            outcome: SummaryOutcome::InsufficientData {
                params: WindowParams::default(),
            },
        };
        let record = VialRecord {
            vial: 5,
            od_trace: PathBuf::from("vial5_OD.txt"),
            dilution_log: PathBuf::from("vial5_pump_log.txt"),
            readings: 0,
            dilutions: 0,
            segments_fitted: 0,
            segments_dropped: 0,
            review_rounds: 1,
            figure: None,
            summary,
        };
        let manifest = RunManifest::new(Path::new("."), Path::new("out.csv"), vec![record]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_manifest_json(&path, &manifest).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "odgrowth");
        assert_eq!(value["vials"][0]["vial"], 5);
        assert_eq!(value["vials"][0]["summary"]["outcome"]["kind"], "insufficient_data");
        // NaN statistics serialize as null.
        assert!(value["vials"][0]["summary"]["untrimmed"]["median"].is_null());
    }
}
