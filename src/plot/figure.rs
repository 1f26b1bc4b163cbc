//! Per-vial SVG figure.
//!
//! Layout:
//! - title: sample label
//! - upper panel: `ln(OD)` readings of every fitted segment plus its OLS line
//! - lower panel: growth-rate series with the selected window marked by two
//!   vertical lines
//!
//! All series and bounds are computed up front; the draw function only draws.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;
use crate::fit::SegmentFit;

const FIGURE_SIZE: (u32, u32) = (1000, 1000);

/// Render and write the figure of one vial.
pub fn write_vial_figure(
    path: &Path,
    title: &str,
    fit: &SegmentFit,
    window: Option<Range<usize>>,
) -> Result<(), AppError> {
    draw_vial_figure(path, title, fit, window)
        .map_err(|e| AppError::render(format!("Failed to render figure '{}': {e}", path.display())))
}

fn draw_vial_figure(
    path: &Path,
    title: &str,
    fit: &SegmentFit,
    window: Option<Range<usize>>,
) -> Result<(), Box<dyn Error>> {
    let od_points: Vec<(f64, f64)> = fit.segments.iter().flat_map(|s| s.points.iter().copied()).collect();
    let rate_points: Vec<(f64, f64)> = fit.series.points.iter().map(|p| (p.time, p.rate)).collect();

    let x_bounds = bounds(od_points.iter().chain(rate_points.iter()).map(|p| p.0));
    let od_bounds = bounds(od_points.iter().map(|p| p.1));
    let rate_bounds = bounds(rate_points.iter().map(|p| p.1));

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 28))?;
    let panels = root.split_evenly((2, 1));

    // Upper panel: ln(OD) with fitted segments.
    let mut upper = ChartBuilder::on(&panels[0])
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_bounds.clone(), od_bounds)?;
    upper
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .y_desc("Natural log of OD 600")
        .x_labels(8)
        .y_labels(6)
        .draw()?;

    let point_color = RGBColor(31, 119, 180);
    for segment in &fit.segments {
        upper.draw_series(
            segment
                .points
                .iter()
                .map(|&(t, y)| Circle::new((t, y), 2, point_color.filled())),
        )?;
        if let (Some(first), Some(last)) = (segment.points.first(), segment.points.last()) {
            upper.draw_series(LineSeries::new(
                [first.0, last.0].map(|t| (t, segment.line.predict(t))),
                &BLACK,
            ))?;
        }
    }

    // Lower panel: growth rates and the selected window.
    let mut lower = ChartBuilder::on(&panels[1])
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_bounds, rate_bounds.clone())?;
    lower
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Time (h)")
        .y_desc("Specific growth rate (h^-1)")
        .x_labels(8)
        .y_labels(6)
        .draw()?;

    lower.draw_series(
        rate_points
            .iter()
            .map(|&(t, r)| Circle::new((t, r), 3, point_color.filled())),
    )?;

    if let Some(w) = window.filter(|w| !w.is_empty() && w.end <= rate_points.len()) {
        let marker_color = RGBColor(214, 39, 40);
        for idx in [w.start, w.end - 1] {
            let t = rate_points[idx].0;
            lower.draw_series(LineSeries::new(
                [(t, rate_bounds.start), (t, rate_bounds.end)],
                &marker_color,
            ))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Padded finite range of `values`, or `0..1` when there is nothing to show.
fn bounds(values: impl Iterator<Item = f64>) -> Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return 0.0..1.0;
    }
    let pad = ((max - min) * 0.05).max(1e-3);
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DilutionLog, OdSample, OdTrace};
    use crate::fit::fit_growth_rates;

    #[test]
    fn bounds_fall_back_for_empty_input() {
        assert_eq!(bounds(std::iter::empty()), 0.0..1.0);
        let b = bounds([1.0, 3.0].into_iter());
        assert!(b.start < 1.0 && b.end > 3.0);
    }

    #[test]
    fn figure_is_written_as_svg() {
        let samples = (0..40)
            .map(|i| {
                let t = i as f64 * 0.25;
                OdSample::new(t, 0.1 * (0.5 * (t % 2.5)).exp())
            })
            .collect();
        let trace = OdTrace::new(samples);
        let fit = fit_growth_rates(&trace, &DilutionLog::new(vec![2.5, 5.0, 7.5]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vial1_wt.svg");
        write_vial_figure(&path, "wt", &fit, Some(0..2)).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_fit_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vial9_empty.svg");
        write_vial_figure(&path, "empty", &SegmentFit::default(), None).unwrap();
        assert!(path.exists());
    }
}
