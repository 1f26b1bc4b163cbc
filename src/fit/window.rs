//! Stable-window search over a growth-rate series.
//!
//! Early and late segments of a run are often transient (start-up, drift at
//! the end of a run, noisy sensors). The search isolates the steady-state part
//! in two phases:
//!
//! 1. **Base window**: slide a window of `window_size` points over the series
//!    and keep the centre whose points have the smallest sum of squared
//!    deviations from their own mean. That sum divided by `window_size` is the
//!    base residual.
//! 2. **Expansion**: grow the window to the right, then to the left, while the
//!    mean squared deviation from the base mean (normalized by the number of
//!    points in the growing window) stays within
//!    `residual_tolerance × base_residual`.
//!
//! The stopping offsets are intentionally asymmetric: the right edge backs off
//! two steps from the violating offset (`stop = x - 2`), the left edge one step
//! (`begin = x - 1`). When no violation occurs the window ends two points short
//! of either end of the series.

use log::debug;

use crate::domain::{GrowthRateSeries, StabilityWindow, WindowParams};
use crate::math::{mean, sum_sq_dev};

/// The flattest fixed-size window of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseWindow {
    pub index: usize,
    /// Minimum sum of squared deviations divided by the window size.
    pub residual: f64,
    pub mean: f64,
}

/// Find the centre of the flattest `window_size`-point window (first on ties).
///
/// Returns `None` if the series is shorter than the window or the window size
/// is even or below 3.
pub fn base_window(rates: &[f64], window_size: usize) -> Option<BaseWindow> {
    if window_size < 3 || window_size % 2 == 0 || rates.len() < window_size {
        return None;
    }
    let h = (window_size - 1) / 2;

    let mut best: Option<(usize, f64)> = None;
    for i in h..rates.len() - h {
        let window = &rates[i - h..=i + h];
        let deviation = sum_sq_dev(window, mean(window));
        match best {
            Some((_, min)) if deviation >= min => {}
            _ => best = Some((i, deviation)),
        }
    }

    let (index, min) = best?;
    Some(BaseWindow {
        index,
        residual: min / window_size as f64,
        mean: mean(&rates[index - h..=index + h]),
    })
}

fn normalized_deviation(window: &[f64], center: f64) -> f64 {
    sum_sq_dev(window, center) / window.len() as f64
}

/// Grow the base window to the right and return the accepted `stop` offset.
pub fn expand_right(rates: &[f64], base: &BaseWindow, h: usize, tolerance: f64) -> isize {
    let limit = tolerance * base.residual;
    let n = rates.len();
    let upper = n.saturating_sub(base.index + h);

    for x in (h + 1)..upper {
        let window = &rates[base.index - h..base.index + x];
        if normalized_deviation(window, base.mean) > limit {
            return x as isize - 2;
        }
    }
    n as isize - base.index as isize - 2
}

/// Grow the base window to the left and return the accepted `begin` offset.
pub fn expand_left(rates: &[f64], base: &BaseWindow, h: usize, tolerance: f64) -> isize {
    let limit = tolerance * base.residual;

    for x in (h + 1)..base.index {
        let window = &rates[base.index - x..base.index + h];
        if normalized_deviation(window, base.mean) > limit {
            return x as isize - 1;
        }
    }
    base.index as isize - 2
}

/// Locate the stable window of `series`.
///
/// Callers are expected to have checked [`WindowParams::has_enough_segments`]
/// first; a series too short for the base window returns `None`.
pub fn find_window(
    series: &GrowthRateSeries,
    window_size: usize,
    residual_tolerance: f64,
) -> Option<StabilityWindow> {
    let rates = series.rates();
    let base = base_window(&rates, window_size)?;
    let h = (window_size - 1) / 2;

    let stop = expand_right(&rates, &base, h, residual_tolerance);
    let begin = expand_left(&rates, &base, h, residual_tolerance);

    debug!(
        "base window at {} (residual {:.3e}, mean {:.4}); begin={begin}, stop={stop}",
        base.index, base.residual, base.mean
    );

    Some(StabilityWindow {
        base_index: base.index,
        begin,
        stop,
    })
}

/// [`find_window`] with the knobs taken from `params`.
pub fn find_window_with(series: &GrowthRateSeries, params: &WindowParams) -> Option<StabilityWindow> {
    find_window(series, params.window_size, params.residual_tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(rates: &[f64]) -> GrowthRateSeries {
        let pairs: Vec<(f64, f64)> = rates
            .iter()
            .enumerate()
            .map(|(i, &r)| (i as f64 + 1.0, r))
            .collect();
        GrowthRateSeries::from_pairs(&pairs)
    }

    /// Transient start, flat plateau, drifting tail.
    fn plateau_run() -> Vec<f64> {
        let mut rates = vec![0.05, 0.10, 0.16, 0.22, 0.26];
        let wobble = [0.001, -0.002, 0.0015, -0.001, 0.0005, 0.002, -0.0015, 0.0, 0.001, -0.0005];
        for i in 0..20 {
            rates.push(0.30 + wobble[i % wobble.len()]);
        }
        rates.extend([0.34, 0.38, 0.42, 0.46, 0.50, 0.55]);
        rates
    }

    #[test]
    fn base_window_prefers_flattest_region() {
        let rates = [0.1, 0.5, 0.25, 0.25, 0.25, 0.9, 0.2];
        let base = base_window(&rates, 3).unwrap();
        assert_eq!(base.index, 3);
        assert_eq!(base.residual, 0.0);
        assert_eq!(base.mean, 0.25);
    }

    #[test]
    fn base_window_takes_first_of_ties() {
        let rates = [1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(base_window(&rates, 3).unwrap().index, 1);
    }

    #[test]
    fn base_window_rejects_bad_sizes() {
        let rates = [0.3; 5];
        assert!(base_window(&rates, 4).is_none());
        assert!(base_window(&rates, 1).is_none());
        assert!(base_window(&rates, 7).is_none());
    }

    #[test]
    fn outlier_tail_is_excluded() {
        let s = series(&[0.30, 0.31, 0.29, 0.45]);
        let w = find_window(&s, 3, 5.0).unwrap();
        assert_eq!(w.base_index, 1);
        let range = w.index_range(s.len());
        assert!(!range.contains(&3), "window {range:?} includes the outlier");
    }

    #[test]
    fn plateau_is_isolated() {
        let rates = plateau_run();
        let s = series(&rates);
        let w = find_window(&s, 5, 5.0).unwrap();
        assert_eq!(w.base_index, 13);
        // Exactly the plateau: indices 5..=24.
        assert_eq!(w.index_range(s.len()), 5..25);
    }

    #[test]
    fn never_violating_run_trims_two_at_each_end() {
        let rates = [0.3; 15];
        let s = series(&rates);
        let w = find_window(&s, 3, 5.0).unwrap();
        assert_eq!(w.base_index, 1);
        assert_eq!(w.first_index(), 2);
        assert_eq!(w.last_index(), 13);
    }

    proptest! {
        #[test]
        fn window_search_is_idempotent(
            rates in prop::collection::vec(0.0f64..1.0, 7..40),
            tolerance in 0.0f64..20.0,
        ) {
            let s = series(&rates);
            prop_assert_eq!(find_window(&s, 5, tolerance), find_window(&s, 5, tolerance));
        }

        #[test]
        fn larger_tolerance_never_shrinks_window(
            rates in prop::collection::vec(0.0f64..1.0, 7..40),
            low in 0.0f64..10.0,
            extra in 0.0f64..10.0,
        ) {
            let s = series(&rates);
            let narrow = find_window(&s, 5, low).unwrap();
            let wide = find_window(&s, 5, low + extra).unwrap();
            prop_assert_eq!(narrow.base_index, wide.base_index);
            prop_assert!(wide.begin >= narrow.begin);
            prop_assert!(wide.stop >= narrow.stop);
        }

        #[test]
        fn expanded_window_contains_base_window(
            rates in prop::collection::vec(0.0f64..1.0, 9..40),
        ) {
            // A generous tolerance never trips on the first expansion step,
            // since that step only revisits the base window.
            let s = series(&rates);
            let w = find_window(&s, 3, 1.5).unwrap();
            let base = w.base_index as isize;
            if w.stop != s.len() as isize - base - 2 {
                prop_assert!(w.last_index() >= base + 1);
            }
            if w.begin != base - 2 {
                prop_assert!(w.first_index() <= base - 1);
            }
        }
    }
}
