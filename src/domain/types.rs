//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and window search
//! - exported to CSV/JSON
//! - handed to the plotting code without copying through intermediate shapes

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default number of fitted segments a vial needs before window search runs.
pub const DEFAULT_MIN_SEGMENTS: usize = 10;
/// Default size of the flattest-region search window (must be odd).
pub const DEFAULT_WINDOW_SIZE: usize = 11;
/// Default residual multiplier allowed while expanding the window.
pub const DEFAULT_RESIDUAL_TOLERANCE: f64 = 5.0;

/// A single OD reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdSample {
    /// Time of the reading (hours in turbidostat exports).
    pub time: f64,
    pub od: f64,
}

impl OdSample {
    pub fn new(time: f64, od: f64) -> Self {
        Self { time, od }
    }

    /// Whether the reading can contribute to a growth-rate fit.
    ///
    /// Non-positive and non-finite ODs are sensor dropouts (`ln` is undefined).
    pub fn is_valid(&self) -> bool {
        self.time.is_finite() && self.od.is_finite() && self.od > 0.0
    }
}

/// OD readings for one vial, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdTrace {
    pub samples: Vec<OdSample>,
}

impl OdTrace {
    pub fn new(samples: Vec<OdSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Readings that survive the dropout filter.
    pub fn valid_samples(&self) -> impl Iterator<Item = &OdSample> {
        self.samples.iter().filter(|s| s.is_valid())
    }
}

/// Times at which the pump diluted the vial. Strictly increasing; may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DilutionLog {
    pub times: Vec<f64>,
}

impl DilutionLog {
    pub fn new(times: Vec<f64>) -> Self {
        Self { times }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Specific growth rate of one segment, stamped with the time that closed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRatePoint {
    pub time: f64,
    pub rate: f64,
}

/// Per-segment growth rates for one vial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRateSeries {
    pub points: Vec<GrowthRatePoint>,
}

impl GrowthRateSeries {
    pub fn new(points: Vec<GrowthRatePoint>) -> Self {
        Self { points }
    }

    /// Build a series from parallel `(time, rate)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self {
            points: pairs
                .iter()
                .map(|&(time, rate)| GrowthRatePoint { time, rate })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.rate).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }
}

/// Stable region of a growth-rate series.
///
/// `begin` and `stop` are offsets from `base_index`; the window covers the
/// inclusive index range `[base_index - begin, base_index + stop]`. Either
/// offset may be negative for very short series, which pulls that edge past
/// the base index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityWindow {
    pub base_index: usize,
    pub begin: isize,
    pub stop: isize,
}

impl StabilityWindow {
    /// First included index (may fall outside the series).
    pub fn first_index(&self) -> isize {
        self.base_index as isize - self.begin
    }

    /// Last included index (may fall outside the series).
    pub fn last_index(&self) -> isize {
        self.base_index as isize + self.stop
    }

    /// Half-open range of indices clamped to a series of length `len`.
    ///
    /// An inverted window yields an empty range.
    pub fn index_range(&self, len: usize) -> Range<usize> {
        let start = self.first_index().clamp(0, len as isize) as usize;
        let end = (self.last_index() + 1).clamp(0, len as isize) as usize;
        if end <= start { start..start } else { start..end }
    }
}

/// Knobs of the automatic window search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    /// A vial needs strictly more fitted segments than this to be windowed.
    pub min_segments: usize,
    /// Size of the flattest-region window (odd, >= 3).
    pub window_size: usize,
    /// Multiple of the base residual tolerated while expanding.
    pub residual_tolerance: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            min_segments: DEFAULT_MIN_SEGMENTS,
            window_size: DEFAULT_WINDOW_SIZE,
            residual_tolerance: DEFAULT_RESIDUAL_TOLERANCE,
        }
    }
}

impl WindowParams {
    /// Points on either side of the window centre.
    pub fn half_width(&self) -> usize {
        (self.window_size - 1) / 2
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.window_size < 3 || self.window_size % 2 == 0 {
            return Err(AppError::params(format!(
                "Invalid window size {} (must be odd and at least 3).",
                self.window_size
            )));
        }
        if !self.residual_tolerance.is_finite() || self.residual_tolerance < 0.0 {
            return Err(AppError::params(format!(
                "Invalid residual tolerance {} (must be finite and >= 0).",
                self.residual_tolerance
            )));
        }
        Ok(())
    }

    /// Whether a series of `len` segments is long enough for window search.
    pub fn has_enough_segments(&self, len: usize) -> bool {
        len > self.min_segments && len >= self.window_size
    }
}

/// Which part of a growth-rate series feeds the trimmed statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSelection {
    /// Found by the stable-window search with `params`.
    Automatic {
        window: StabilityWindow,
        params: WindowParams,
    },
    /// Picked by the user as a time interval.
    Manual {
        range: Range<usize>,
        start_time: f64,
        stop_time: f64,
    },
    /// The series was too short to search with `params`.
    Insufficient { params: WindowParams },
}

impl WindowSelection {
    /// Selected indices, or `None` when nothing could be selected.
    pub fn index_range(&self, len: usize) -> Option<Range<usize>> {
        match self {
            WindowSelection::Automatic { window, .. } => Some(window.index_range(len)),
            WindowSelection::Manual { range, .. } => {
                let end = range.end.min(len);
                Some(range.start.min(end)..end)
            }
            WindowSelection::Insufficient { .. } => None,
        }
    }
}

/// Median, mean, population standard deviation and count of a set of rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateStats {
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl RateStats {
    /// Statistics of an empty set.
    pub fn empty() -> Self {
        Self {
            median: f64::NAN,
            mean: f64::NAN,
            std_dev: f64::NAN,
            count: 0,
        }
    }
}

/// How the trimmed statistics of a vial were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// Automatic window search succeeded.
    Windowed {
        trimmed: RateStats,
        window: StabilityWindow,
        params: WindowParams,
    },
    /// The user picked the window by time.
    ManualWindowed {
        trimmed: RateStats,
        start_time: f64,
        stop_time: f64,
    },
    /// Too few segments to search for a window.
    InsufficientData { params: WindowParams },
}

impl SummaryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SummaryOutcome::Windowed { .. } => "windowed",
            SummaryOutcome::ManualWindowed { .. } => "manual",
            SummaryOutcome::InsufficientData { .. } => "insufficient data",
        }
    }

    pub fn trimmed(&self) -> Option<&RateStats> {
        match self {
            SummaryOutcome::Windowed { trimmed, .. } | SummaryOutcome::ManualWindowed { trimmed, .. } => {
                Some(trimmed)
            }
            SummaryOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Final record for one vial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub sample_name: String,
    pub vial: u32,
    pub untrimmed: RateStats,
    pub outcome: SummaryOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_samples_are_dropouts() {
        assert!(OdSample::new(1.0, 0.2).is_valid());
        assert!(!OdSample::new(1.0, 0.0).is_valid());
        assert!(!OdSample::new(1.0, -0.1).is_valid());
        assert!(!OdSample::new(1.0, f64::NAN).is_valid());
    }

    #[test]
    fn window_range_is_inclusive_and_clamped() {
        let w = StabilityWindow { base_index: 5, begin: 2, stop: 3 };
        assert_eq!(w.index_range(20), 3..9);
        assert_eq!(w.index_range(7), 3..7);

        let inverted = StabilityWindow { base_index: 1, begin: -1, stop: -1 };
        assert!(inverted.index_range(4).is_empty());
    }

    #[test]
    fn params_reject_even_or_tiny_windows() {
        let mut p = WindowParams::default();
        assert!(p.validate().is_ok());
        p.window_size = 4;
        assert!(p.validate().is_err());
        p.window_size = 1;
        assert!(p.validate().is_err());
        p.window_size = 3;
        p.residual_tolerance = -1.0;
        assert!(p.validate().is_err());
    }
}
