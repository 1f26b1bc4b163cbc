//! Per-segment growth-rate fitting.
//!
//! A turbidostat trace is cut at every dilution event. Each piece between two
//! dilutions grows exponentially, so `ln(OD)` is linear in time and the OLS
//! slope of that line is the segment's specific growth rate.
//!
//! Fitting happens in two passes:
//! 1. [`split_segments`] scans the trace once and materializes every segment as
//!    an immutable list of `(time, ln OD)` points plus the time that closed it.
//! 2. [`fit_growth_rates`] folds each segment through [`fit_line`].
//!
//! Boundary rules:
//! - readings with non-positive or non-finite OD are dropouts and are skipped
//!   entirely (they neither join a segment nor close one)
//! - the first reading at or after the next dilution time closes the current
//!   segment; that reading is not part of any segment
//! - each closing reading consumes exactly one dilution event
//! - a non-empty tail closes at the last valid reading's time

use crate::domain::{DilutionLog, GrowthRatePoint, GrowthRateSeries, OdTrace};
use crate::math::{LineFit, fit_line};

/// Readings of one segment in `(time, ln OD)` space.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub points: Vec<(f64, f64)>,
    /// Time of the reading that closed the segment.
    pub close_time: f64,
}

/// A segment with its fitted line (kept for plotting).
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSegment {
    pub points: Vec<(f64, f64)>,
    pub line: LineFit,
    pub close_time: f64,
}

/// Output of [`fit_growth_rates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentFit {
    pub series: GrowthRateSeries,
    pub segments: Vec<FittedSegment>,
    /// Segments that closed with fewer than two usable points.
    pub dropped_segments: usize,
}

/// Cut the valid readings of `trace` at the dilution times in `dilutions`.
pub fn split_segments(trace: &OdTrace, dilutions: &DilutionLog) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(dilutions.len() + 1);
    let mut pending = dilutions.times.iter().copied();
    let mut next_dilution = pending.next().unwrap_or(f64::INFINITY);

    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut last_time = None;

    for sample in trace.valid_samples() {
        last_time = Some(sample.time);
        if sample.time < next_dilution {
            current.push((sample.time, sample.od.ln()));
            continue;
        }

        segments.push(Segment {
            points: std::mem::take(&mut current),
            close_time: sample.time,
        });
        next_dilution = pending.next().unwrap_or(f64::INFINITY);
    }

    if let Some(close_time) = last_time {
        if !current.is_empty() {
            segments.push(Segment {
                points: current,
                close_time,
            });
        }
    }

    segments
}

/// Fit a specific growth rate to every segment of `trace`.
///
/// Segments that cannot be fitted (fewer than two points, or all points at
/// the same time) are skipped and counted in `dropped_segments`.
pub fn fit_growth_rates(trace: &OdTrace, dilutions: &DilutionLog) -> SegmentFit {
    split_segments(trace, dilutions)
        .into_iter()
        .fold(SegmentFit::default(), |mut out, segment| {
            match fit_line(&segment.points) {
                Some(line) => {
                    out.series.points.push(GrowthRatePoint {
                        time: segment.close_time,
                        rate: line.slope,
                    });
                    out.segments.push(FittedSegment {
                        points: segment.points,
                        line,
                        close_time: segment.close_time,
                    });
                }
                None => out.dropped_segments += 1,
            }
            out
        })
}
