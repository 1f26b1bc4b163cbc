//! ASCII plotting of a growth-rate series for terminal review.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks while deciding whether to accept a window
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - points inside the selected window: `o`
//! - points outside the window: `.`
//! - window boundaries: `|` columns

use std::ops::Range;

use crate::domain::GrowthRateSeries;

/// Render `series` with the (half-open) index range `window` highlighted.
pub fn render_growth_plot(
    series: &GrowthRateSeries,
    window: Option<Range<usize>>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((t_min, t_max)) = finite_range(series.points.iter().map(|p| p.time)) else {
        return "Plot: not enough growth-rate points to draw.\n".to_string();
    };
    let (r_min, r_max) = finite_range(series.points.iter().map(|p| p.rate)).unwrap_or((0.0, 1.0));
    let (r_min, r_max) = pad_range(r_min, r_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Window boundaries first so points overlay them.
    let window = window.filter(|w| !w.is_empty() && w.end <= series.len());
    if let Some(w) = &window {
        for idx in [w.start, w.end - 1] {
            let x = map_x(series.points[idx].time, t_min, t_max, width);
            for row in grid.iter_mut() {
                row[x] = '|';
            }
        }
    }

    for (idx, p) in series.points.iter().enumerate() {
        if !(p.time.is_finite() && p.rate.is_finite()) {
            continue;
        }
        let x = map_x(p.time, t_min, t_max, width);
        let y = map_y(p.rate, r_min, r_max, height);
        let inside = window.as_ref().is_some_and(|w| w.contains(&idx));
        grid[y][x] = if inside { 'o' } else { '.' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: t=[{t_min:.2}, {t_max:.2}] h | rate=[{r_min:.4}, {r_max:.4}] 1/h\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let series = GrowthRateSeries::from_pairs(&[(0.0, 0.1), (3.0, 0.3), (6.0, 0.3), (9.0, 0.5)]);

        let txt = render_growth_plot(&series, Some(1..3), 10, 5);
        let expected = concat!(
            "Plot: t=[0.00, 9.00] h | rate=[0.0800, 0.5200] 1/h\n",
            "   |  |  .\n",
            "   |  |\n",
            "   o  o\n",
            "   |  |\n",
            ".  |  |\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn degenerate_series_renders_a_hint() {
        let series = GrowthRateSeries::from_pairs(&[(1.0, 0.3)]);
        assert!(render_growth_plot(&series, None, 20, 5).contains("not enough"));
    }
}
