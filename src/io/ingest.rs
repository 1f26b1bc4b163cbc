//! Turbidostat file ingest.
//!
//! Two files exist per vial:
//!
//! - `vial{N}_OD.txt`: CSV, one header row, then `time,od` rows
//! - `vial{N}_pump_log.txt`: CSV, a header row and a `0,0` sentinel row, then
//!   rows whose first field is the time of a dilution (other fields ignored)
//!
//! Design goals:
//! - **Strict times**: an unparsable time is fatal (exit code 2) and reports
//!   file and line
//! - **Lenient OD**: empty OD fields become NaN and are later treated as sensor
//!   dropout, like the instrument's own `nan` entries
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::domain::{DilutionLog, OdSample, OdTrace};
use crate::error::AppError;

/// Rows skipped at the top of a dilution log (header + `0,0` sentinel).
const DILUTION_LOG_SKIPPED_ROWS: usize = 2;

/// Read an OD trace file.
pub fn read_od_trace(path: &Path) -> Result<OdTrace, AppError> {
    let file = open(path, "OD trace")?;
    let trace = parse_od_trace(file, &path.display().to_string())?;
    debug!("read {} OD readings from {}", trace.len(), path.display());
    Ok(trace)
}

/// Read a dilution (pump) log file.
pub fn read_dilution_log(path: &Path) -> Result<DilutionLog, AppError> {
    let file = open(path, "pump log")?;
    let log = parse_dilution_log(file, &path.display().to_string())?;
    debug!("read {} dilution events from {}", log.len(), path.display());
    Ok(log)
}

/// Parse OD trace CSV from any reader. `source` names the input in errors.
pub fn parse_od_trace<R: Read>(reader: R, source: &str) -> Result<OdTrace, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::io(format!("{source}: CSV parse error: {e}")))?;
        let line = record_line(&record);

        let time = parse_time(record.get(0), source, line)?;
        let od = match record.get(1).filter(|s| !s.is_empty()) {
            None => f64::NAN,
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                AppError::io(format!("{source}:{line}: invalid OD value '{raw}'"))
            })?,
        };
        samples.push(OdSample::new(time, od));
    }

    Ok(OdTrace::new(samples))
}

/// Parse dilution log CSV from any reader. `source` names the input in errors.
pub fn parse_dilution_log<R: Read>(reader: R, source: &str) -> Result<DilutionLog, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut times = Vec::new();
    for result in reader.records().skip(DILUTION_LOG_SKIPPED_ROWS) {
        let record = result.map_err(|e| AppError::io(format!("{source}: CSV parse error: {e}")))?;
        let line = record_line(&record);
        times.push(parse_time(record.get(0), source, line)?);
    }

    Ok(DilutionLog::new(times))
}

fn open(path: &Path, what: &str) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::io(format!("Failed to open {what} '{}': {e}", path.display())))
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_time(field: Option<&str>, source: &str, line: u64) -> Result<f64, AppError> {
    let raw = field
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::io(format!("{source}:{line}: missing time value")))?;
    let time = raw
        .parse::<f64>()
        .map_err(|_| AppError::io(format!("{source}:{line}: invalid time value '{raw}'")))?;
    if !time.is_finite() {
        return Err(AppError::io(format!("{source}:{line}: time must be finite (got '{raw}')")));
    }
    Ok(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn od_trace_skips_header_and_keeps_dropouts() {
        let text = "time,od\n0.0,0.10\n0.5,nan\n1.0,\n1.5,0.13\n";
        let trace = parse_od_trace(text.as_bytes(), "vial1_OD.txt").unwrap();

        assert_eq!(trace.len(), 4);
        assert_eq!(trace.samples[0], OdSample::new(0.0, 0.10));
        assert!(trace.samples[1].od.is_nan());
        assert!(trace.samples[2].od.is_nan());
        assert_eq!(trace.valid_samples().count(), 2);
    }

    #[test]
    fn od_trace_rejects_bad_times_with_location() {
        let text = "time,od\n0.0,0.10\nabc,0.2\n";
        let err = parse_od_trace(text.as_bytes(), "vial1_OD.txt").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("vial1_OD.txt:3"), "{err}");
    }

    #[test]
    fn dilution_log_skips_header_and_sentinel() {
        let text = "time,pump\n0,0\n2.5,1\n5.1,1\n7.9,1\n";
        let log = parse_dilution_log(text.as_bytes(), "vial1_pump_log.txt").unwrap();
        assert_eq!(log.times, vec![2.5, 5.1, 7.9]);
    }

    #[test]
    fn dilution_log_may_be_empty() {
        let text = "time,pump\n0,0\n";
        let log = parse_dilution_log(text.as_bytes(), "vial1_pump_log.txt").unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn files_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vial2_OD.txt");
        std::fs::write(&path, "time,od\n0,0.1\n1,0.2\n").unwrap();
        assert_eq!(read_od_trace(&path).unwrap().len(), 2);

        let missing = dir.path().join("vial2_pump_log.txt");
        assert_eq!(read_dilution_log(&missing).unwrap_err().exit_code(), 2);
    }
}
