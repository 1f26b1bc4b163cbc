//! Shared per-vial pipeline used by the interactive and unattended front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read trace + pump log -> segment fit -> window review loop -> summary -> figure
//!
//! The front-ends only decide how windows get reviewed (a [`ReviewPolicy`]) and
//! where the run's outputs go.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::domain::{SampleSummary, SummaryOutcome, WindowParams};
use crate::error::AppError;
use crate::fit::fit_growth_rates;
use crate::io::{
    RunManifest, VialRecord, dilution_log_path, figure_path, od_trace_path, read_dilution_log,
    read_od_trace, write_manifest_json, write_summary_csv,
};
use crate::plot::write_vial_figure;
use crate::review::{ReviewPolicy, review_vial};

/// One vial to analyze and its sample label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VialJob {
    pub vial: u32,
    pub sample_name: String,
}

/// Where a run reads from and writes to, and the starting search parameters.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    /// `None` disables figures.
    pub figures_dir: Option<PathBuf>,
    pub params: WindowParams,
}

/// Pair vials with labels. Counts must match.
pub fn build_jobs(vials: &[u32], labels: &[String]) -> Result<Vec<VialJob>, AppError> {
    if vials.len() != labels.len() {
        return Err(AppError::io(format!(
            "Got {} sample name(s) for {} vial(s); give exactly one name per vial.",
            labels.len(),
            vials.len()
        )));
    }
    Ok(vials
        .iter()
        .zip(labels)
        .map(|(&vial, label)| VialJob {
            vial,
            sample_name: label.clone(),
        })
        .collect())
}

/// Analyze one vial and return its diagnostics (summary included).
pub fn analyze_vial(job: &VialJob, config: &RunConfig, policy: &mut dyn ReviewPolicy) -> Result<VialRecord, AppError> {
    let od_path = od_trace_path(&config.data_dir, job.vial);
    let log_path = dilution_log_path(&config.data_dir, job.vial);
    let trace = read_od_trace(&od_path)?;
    let dilutions = read_dilution_log(&log_path)?;

    let fit = fit_growth_rates(&trace, &dilutions);
    if fit.dropped_segments > 0 {
        warn!(
            "vial {}: {} segment(s) had fewer than two usable readings and were skipped",
            job.vial, fit.dropped_segments
        );
    }

    let figure = match &config.figures_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
            Some(figure_path(dir, job.vial, &job.sample_name))
        }
        None => None,
    };

    let outcome = review_vial(job.vial, &job.sample_name, &fit, config.params, policy, |round| {
        match &figure {
            Some(path) => write_vial_figure(
                path,
                &job.sample_name,
                round.fit,
                round.selection.index_range(round.fit.series.len()),
            ),
            None => Ok(()),
        }
    })?;

    log_outcome(&outcome.summary);

    Ok(VialRecord {
        vial: job.vial,
        od_trace: od_path,
        dilution_log: log_path,
        readings: trace.len(),
        dilutions: dilutions.len(),
        segments_fitted: fit.series.len(),
        segments_dropped: fit.dropped_segments,
        review_rounds: outcome.rounds,
        figure,
        summary: outcome.summary,
    })
}

fn log_outcome(summary: &SampleSummary) {
    match &summary.outcome {
        SummaryOutcome::InsufficientData { .. } => warn!(
            "Vial{} failed analysis because it had too few data points.",
            summary.vial
        ),
        outcome => {
            if let Some(trimmed) = outcome.trimmed() {
                info!(
                    "vial {} ({}): {} median growth rate {:.4} 1/h over {} of {} segments",
                    summary.vial,
                    summary.sample_name,
                    outcome.label(),
                    trimmed.median,
                    trimmed.count,
                    summary.untrimmed.count
                );
            }
        }
    }
}

/// Analyze every job in order, one vial at a time.
pub fn analyze_run(
    jobs: &[VialJob],
    config: &RunConfig,
    policy: &mut dyn ReviewPolicy,
) -> Result<Vec<VialRecord>, AppError> {
    config.params.validate()?;
    jobs.iter().map(|job| analyze_vial(job, config, policy)).collect()
}

/// Write the summary CSV and, when asked, the JSON manifest.
pub fn write_run_outputs(
    records: &[VialRecord],
    config: &RunConfig,
    summary_csv: &Path,
    manifest: Option<&Path>,
) -> Result<(), AppError> {
    let summaries: Vec<SampleSummary> = records.iter().map(|r| r.summary.clone()).collect();
    write_summary_csv(summary_csv, &summaries)?;
    info!("wrote {} summary row(s) to {}", summaries.len(), summary_csv.display());

    if let Some(path) = manifest {
        let manifest = RunManifest::new(&config.data_dir, summary_csv, records.to_vec());
        write_manifest_json(path, &manifest)?;
        info!("wrote run manifest to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::summary_record;
    use crate::review::{AcceptAll, ReviewDecision, ReviewRound};

    fn write_trace(dir: &Path, vial: u32, samples: &[(f64, f64)]) {
        let mut body = String::from("time,OD\n");
        for (t, od) in samples {
            body.push_str(&format!("{t},{od}\n"));
        }
        std::fs::write(od_trace_path(dir, vial), body).unwrap();
    }

    fn write_log(dir: &Path, vial: u32, times: &[f64]) {
        let mut body = String::from("time,pump\n0,0\n");
        for t in times {
            body.push_str(&format!("{t},1\n"));
        }
        std::fs::write(dilution_log_path(dir, vial), body).unwrap();
    }

    fn config(dir: &Path, figures: bool) -> RunConfig {
        RunConfig {
            data_dir: dir.to_path_buf(),
            figures_dir: figures.then(|| dir.join("figures")),
            params: WindowParams::default(),
        }
    }

    /// One segment of 0.5h readings per entry of `rates`, each closed by a dilution.
    fn segmented_run(rates: &[f64]) -> (Vec<(f64, f64)>, Vec<f64>) {
        let mut samples = Vec::new();
        let mut dilutions = Vec::new();
        let mut t = 0.0;
        for &rate in rates {
            let start = t;
            for _ in 0..6 {
                samples.push((t, 0.1 * (rate * (t - start)).exp()));
                t += 0.5;
            }
            // Crossing reading, then the pump fires.
            samples.push((t, 0.5));
            dilutions.push(t);
            t += 0.5;
        }
        (samples, dilutions)
    }

    #[test]
    fn labels_must_match_vials() {
        let err = build_jobs(&[1, 2], &["a".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let jobs = build_jobs(&[7], &["wt".to_string()]).unwrap();
        assert_eq!(jobs[0], VialJob { vial: 7, sample_name: "wt".to_string() });
    }

    #[test]
    fn pure_exponential_without_dilutions_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<(f64, f64)> = (0..20).map(|i| (i as f64, (0.3 * i as f64).exp())).collect();
        write_trace(dir.path(), 1, &samples);
        write_log(dir.path(), 1, &[]);

        let job = VialJob { vial: 1, sample_name: "wt".to_string() };
        let record = analyze_vial(&job, &config(dir.path(), false), &mut AcceptAll).unwrap();

        assert_eq!(record.segments_fitted, 1);
        assert!(matches!(record.summary.outcome, SummaryOutcome::InsufficientData { .. }));
        assert!((record.summary.untrimmed.median - 0.3).abs() < 1e-9);
        let row = summary_record(&record.summary);
        assert_eq!(&row[1..5], &["nan", "nan", "nan", "nan"]);
    }

    #[test]
    fn outlier_segments_are_trimmed() {
        let mut rates = vec![0.30; 12];
        rates[0] = 0.10;
        rates[11] = 0.60;
        let (samples, dilutions) = segmented_run(&rates);
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), 2, &samples);
        write_log(dir.path(), 2, &dilutions);

        let job = VialJob { vial: 2, sample_name: "Strain A/1".to_string() };
        let record = analyze_vial(&job, &config(dir.path(), true), &mut AcceptAll).unwrap();

        assert_eq!(record.segments_fitted, 12);
        let SummaryOutcome::Windowed { trimmed, .. } = &record.summary.outcome else {
            panic!("expected an automatic window, got {:?}", record.summary.outcome);
        };
        assert!((trimmed.median - 0.30).abs() < 1e-9);
        assert!((record.summary.untrimmed.mean - 0.30).abs() > 1e-3);

        let figure = record.figure.unwrap();
        assert_eq!(figure.file_name().unwrap(), "vial2_strain-a1.svg");
        assert!(figure.exists());
    }

    #[test]
    fn trailing_outlier_segment_is_excluded() {
        // Three dilutions, four segments; the tail closes at the last reading.
        let (mut samples, mut dilutions) = segmented_run(&[0.30, 0.31, 0.29, 0.45]);
        samples.pop();
        dilutions.pop();
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), 4, &samples);
        write_log(dir.path(), 4, &dilutions);

        let mut cfg = config(dir.path(), false);
        cfg.params = WindowParams {
            min_segments: 3,
            window_size: 3,
            residual_tolerance: 5.0,
        };
        let job = VialJob { vial: 4, sample_name: "wt".to_string() };
        let record = analyze_vial(&job, &cfg, &mut AcceptAll).unwrap();

        assert_eq!(record.segments_fitted, 4);
        let SummaryOutcome::Windowed { trimmed, window, .. } = &record.summary.outcome else {
            panic!("expected an automatic window, got {:?}", record.summary.outcome);
        };
        assert_eq!(window.base_index, 1);
        assert!(!window.index_range(4).contains(&3));
        assert!(trimmed.count >= 1);
        assert!(trimmed.median < 0.4);
    }

    #[test]
    fn manual_window_row_is_marked_user_defined() {
        let (samples, dilutions) = segmented_run(&[0.2, 0.25, 0.3, 0.35]);
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), 3, &samples);
        write_log(dir.path(), 3, &dilutions);

        let mut first = true;
        let mut policy = move |_: &ReviewRound<'_>| -> Result<ReviewDecision, AppError> {
            if std::mem::take(&mut first) {
                Ok(ReviewDecision::Manual { start_time: 0.0, stop_time: 1e9 })
            } else {
                Ok(ReviewDecision::Accept)
            }
        };
        let job = VialJob { vial: 3, sample_name: "wt".to_string() };
        let record = analyze_vial(&job, &config(dir.path(), false), &mut policy).unwrap();

        assert_eq!(record.review_rounds, 2);
        let row = summary_record(&record.summary);
        assert_eq!(row[4], "4");
        assert_eq!(row[9], "Defined by user");
        assert_eq!(row[10], "");
    }

    #[test]
    fn missing_trace_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = VialJob { vial: 9, sample_name: "none".to_string() };
        let err = analyze_vial(&job, &config(dir.path(), false), &mut AcceptAll).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn run_outputs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let (samples, dilutions) = segmented_run(&[0.3; 12]);
        for vial in [1, 2] {
            write_trace(dir.path(), vial, &samples);
            write_log(dir.path(), vial, &dilutions);
        }
        let cfg = config(dir.path(), false);
        let jobs = build_jobs(&[1, 2], &["a".to_string(), "b".to_string()]).unwrap();
        let records = analyze_run(&jobs, &cfg, &mut AcceptAll).unwrap();

        let csv_path = dir.path().join("out.csv");
        let manifest_path = dir.path().join("run.json");
        write_run_outputs(&records, &cfg, &csv_path, Some(&manifest_path)).unwrap();

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().nth(1).unwrap().starts_with("a,"));
        assert!(manifest_path.exists());
    }

    #[test]
    fn invalid_params_abort_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), false);
        cfg.params.window_size = 6;
        let jobs = build_jobs(&[1], &["a".to_string()]).unwrap();
        let err = analyze_run(&jobs, &cfg, &mut AcceptAll).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
