//! Reduce a growth-rate series and its selected window to a summary record.

use crate::domain::{GrowthRateSeries, RateStats, SampleSummary, SummaryOutcome, WindowSelection};
use crate::math::{mean, median, population_std};

/// Median, mean, population std and count of `rates`.
pub fn rate_stats(rates: &[f64]) -> RateStats {
    if rates.is_empty() {
        return RateStats::empty();
    }
    RateStats {
        median: median(rates),
        mean: mean(rates),
        std_dev: population_std(rates),
        count: rates.len(),
    }
}

/// Build the summary record of one vial.
///
/// Trimmed statistics cover the selected window, untrimmed ones the whole
/// series. An empty window yields NaN trimmed statistics.
pub fn summarize(
    sample_name: &str,
    vial: u32,
    series: &GrowthRateSeries,
    selection: &WindowSelection,
) -> SampleSummary {
    let rates = series.rates();
    let untrimmed = rate_stats(&rates);

    let outcome = match selection {
        WindowSelection::Automatic { window, params } => SummaryOutcome::Windowed {
            trimmed: rate_stats(&rates[window.index_range(rates.len())]),
            window: *window,
            params: *params,
        },
        WindowSelection::Manual {
            start_time,
            stop_time,
            ..
        } => {
            let range = selection.index_range(rates.len()).unwrap_or_default();
            SummaryOutcome::ManualWindowed {
                trimmed: rate_stats(&rates[range]),
                start_time: *start_time,
                stop_time: *stop_time,
            }
        }
        WindowSelection::Insufficient { params } => SummaryOutcome::InsufficientData { params: *params },
    };

    SampleSummary {
        sample_name: sample_name.to_string(),
        vial,
        untrimmed,
        outcome,
    }
}
