//! User-defined window selection by time.

use std::ops::Range;

use crate::domain::GrowthRateSeries;

/// Select the points of `series` whose time lies in `[start_time, stop_time]`.
///
/// Returns a half-open index range:
/// - `start` is the first index with `time >= start_time`
/// - `end` is the first index with `time > stop_time`, or `len` when no point
///   exceeds it
///
/// Out-of-range inputs degenerate gracefully: `(-inf, +inf)` selects the whole
/// series, and a start after the last point yields an empty range.
pub fn select_by_time(series: &GrowthRateSeries, start_time: f64, stop_time: f64) -> Range<usize> {
    let points = &series.points;
    let start = points
        .iter()
        .position(|p| p.time >= start_time)
        .unwrap_or(points.len());
    let end = points
        .iter()
        .position(|p| p.time > stop_time)
        .unwrap_or(points.len());

    if end <= start { start..start } else { start..end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> GrowthRateSeries {
        GrowthRateSeries::from_pairs(&[(1.0, 0.3), (2.0, 0.31), (3.0, 0.29), (4.0, 0.45)])
    }

    #[test]
    fn unbounded_selection_is_full_series() {
        let s = series();
        assert_eq!(select_by_time(&s, f64::NEG_INFINITY, f64::INFINITY), 0..4);
        assert_eq!(select_by_time(&s, -100.0, 100.0), 0..4);
    }

    #[test]
    fn bounds_are_inclusive_in_time() {
        let s = series();
        assert_eq!(select_by_time(&s, 2.0, 3.0), 1..3);
        assert_eq!(select_by_time(&s, 1.5, 3.5), 1..3);
        assert_eq!(select_by_time(&s, 0.0, 1.0), 0..1);
    }

    #[test]
    fn inverted_or_out_of_range_requests_are_empty() {
        let s = series();
        assert!(select_by_time(&s, 10.0, 20.0).is_empty());
        assert!(select_by_time(&s, 3.0, 2.0).is_empty());
        assert!(select_by_time(&GrowthRateSeries::default(), 0.0, 1.0).is_empty());
    }
}
