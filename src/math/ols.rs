//! Ordinary least squares.
//!
//! Every segment of a turbidostat run is fitted with a straight line in
//! `(time, ln OD)` space:
//!
//! ```text
//! minimize Σ (y_i - (b + m·t_i))^2
//! ```
//!
//! The slope `m` is the specific growth rate of the segment.
//!
//! Implementation choices:
//! - The design matrix is `[1, t]` and the system is solved with SVD, which
//!   copes with tall matrices (many readings per segment).
//! - Time is centred on the segment mean before solving so that large absolute
//!   run times (hundreds of hours) do not hurt the conditioning of the solve.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted line `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a straight line through `points` by ordinary least squares.
///
/// Needs at least two points with distinct `x`; returns `None` otherwise.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let spread = points.iter().map(|p| (p.0 - x_mean).powi(2)).sum::<f64>();
    if !(spread.is_finite() && spread > 0.0) {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    let mut y = DVector::<f64>::zeros(n);
    for (row, &(px, py)) in points.iter().enumerate() {
        design[(row, 0)] = 1.0;
        design[(row, 1)] = px - x_mean;
        y[row] = py;
    }

    let beta = solve_least_squares(&design, &y)?;
    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;
    if !(slope.is_finite() && intercept.is_finite()) {
        return None;
    }

    Some(LineFit { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_growth_line() {
        // ln(OD) = -2 + 0.4 t sampled at t = 0, 0.5, 1, 1.5
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.5]);
        let y = DVector::from_row_slice(&[-2.0, -1.8, -1.6, -1.4]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] + 2.0).abs() < 1e-10);
        assert!((beta[1] - 0.4).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_slope_at_large_offsets() {
        let points: Vec<(f64, f64)> = (0..10)
            .map(|i| {
                let t = 500.0 + i as f64 * 0.1;
                (t, 0.25 * t - 3.0)
            })
            .collect();

        let fit = fit_line(&points).unwrap();
        assert!((fit.slope - 0.25).abs() < 1e-9, "slope = {}", fit.slope);
        assert!((fit.predict(500.0) - 122.0).abs() < 1e-6);
    }

    #[test]
    fn fit_line_needs_two_distinct_times() {
        assert!(fit_line(&[]).is_none());
        assert!(fit_line(&[(1.0, 2.0)]).is_none());
        assert!(fit_line(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
        assert!(fit_line(&[(1.0, 2.0), (2.0, 3.0)]).is_some());
    }
}
