//! Synthetic turbidostat runs.
//!
//! Each vial grows exponentially at a fixed specific rate. Readings carry
//! multiplicative log-normal noise and can randomly drop out (`nan`). When a
//! reading reaches the dilution threshold the pump fires at that reading's
//! time and the culture restarts from `dilute_to`.
//!
//! Output matches the instrument's files, so a simulated directory can be
//! analyzed exactly like a real run.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DilutionLog, OdSample, OdTrace};
use crate::error::AppError;
use crate::io::{dilution_log_path, od_trace_path};

/// Parameters of a simulated vial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// True specific growth rate (1/h).
    pub rate: f64,
    /// Standard deviation of the log-normal reading noise.
    pub noise: f64,
    pub hours: f64,
    /// Time between readings (hours).
    pub interval: f64,
    pub start_od: f64,
    pub threshold: f64,
    pub dilute_to: f64,
    pub dropout_prob: f64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rate: 0.35,
            noise: 0.01,
            hours: 48.0,
            interval: 2.0 / 60.0,
            start_od: 0.05,
            threshold: 0.3,
            dilute_to: 0.2,
            dropout_prob: 0.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |what: &str| -> Result<(), AppError> {
            Err(AppError::params(format!("Invalid simulation setting: {what}.")))
        };

        if !(self.rate.is_finite() && self.rate > 0.0) {
            return invalid("rate must be > 0");
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return invalid("noise must be >= 0");
        }
        if !(self.hours.is_finite() && self.interval.is_finite() && self.hours > 0.0 && self.interval > 0.0) {
            return invalid("hours and interval must be > 0");
        }
        if !(self.start_od > 0.0 && self.dilute_to > 0.0 && self.dilute_to < self.threshold) {
            return invalid("ODs must satisfy 0 < dilute-to < threshold and start OD > 0");
        }
        if !(0.0..1.0).contains(&self.dropout_prob) {
            return invalid("dropout probability must be in [0, 1)");
        }
        Ok(())
    }
}

/// Simulate one vial. The same config and vial number always give the same run.
pub fn simulate_vial(config: &SimConfig, vial: u32) -> Result<(OdTrace, DilutionLog), AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(u64::from(vial)));
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::params(format!("Noise distribution error: {e}")))?;

    let steps = (config.hours / config.interval).floor() as usize;
    let growth = (config.rate * config.interval).exp();

    let mut samples = Vec::with_capacity(steps + 1);
    let mut dilutions = Vec::new();
    let mut od = config.start_od;

    for step in 0..=steps {
        let time = step as f64 * config.interval;
        let observed = od * normal.sample(&mut rng).exp();

        if rng.gen_bool(config.dropout_prob) {
            samples.push(OdSample::new(time, f64::NAN));
        } else {
            samples.push(OdSample::new(time, observed));
            if observed >= config.threshold {
                dilutions.push(time);
                od = config.dilute_to;
            }
        }
        od *= growth;
    }

    Ok((OdTrace::new(samples), DilutionLog::new(dilutions)))
}

/// Simulate `vials` and write their OD traces and pump logs into `dir`.
///
/// Returns the paths written, trace before log for every vial.
pub fn write_simulated_run(dir: &Path, vials: &[u32], config: &SimConfig) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(vials.len() * 2);
    for &vial in vials {
        let (trace, log) = simulate_vial(config, vial)?;

        let trace_path = od_trace_path(dir, vial);
        write_od_trace(&trace_path, &trace)?;
        let log_path = dilution_log_path(dir, vial);
        write_dilution_log(&log_path, &log)?;

        info!(
            "vial {vial}: simulated {} readings and {} dilutions",
            trace.len(),
            log.len()
        );
        written.push(trace_path);
        written.push(log_path);
    }
    Ok(written)
}

fn write_od_trace(path: &Path, trace: &OdTrace) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, path, ["time", "OD"].map(String::from))?;
    for s in &trace.samples {
        let od = if s.od.is_nan() { "nan".to_string() } else { format!("{:.6}", s.od) };
        write_row(&mut writer, path, [format!("{:.5}", s.time), od])?;
    }
    finish(writer, path)
}

fn write_dilution_log(path: &Path, log: &DilutionLog) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, path, ["time", "pump"].map(String::from))?;
    write_row(&mut writer, path, ["0", "0"].map(String::from))?;
    for &t in &log.times {
        write_row(&mut writer, path, [format!("{t:.5}"), "1".to_string()])?;
    }
    finish(writer, path)
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

fn write_row(writer: &mut csv::Writer<File>, path: &Path, row: [String; 2]) -> Result<(), AppError> {
    writer
        .write_record(&row)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

fn finish(mut writer: csv::Writer<File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}
