//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting/windowing code stays clean and testable
//! - output changes are localized

use crate::domain::{RateStats, SampleSummary, SummaryOutcome};

/// Format the per-vial block printed after each analysis round.
pub fn format_vial_report(summary: &SampleSummary, dropped_segments: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== vial {} - {} ===\n",
        summary.vial, summary.sample_name
    ));
    out.push_str(&format!(
        "Segments: fitted={} | dropped={}\n",
        summary.untrimmed.count, dropped_segments
    ));

    match &summary.outcome {
        SummaryOutcome::Windowed {
            trimmed,
            window,
            params,
        } => {
            out.push_str(&format!(
                "Window: base={} begin={} stop={} (min segments={}, window size={}, residuals allowed={})\n",
                window.base_index,
                window.begin,
                window.stop,
                params.min_segments,
                params.window_size,
                params.residual_tolerance
            ));
            out.push_str(&format_stats_line("trimmed  ", trimmed));
        }
        SummaryOutcome::ManualWindowed {
            trimmed,
            start_time,
            stop_time,
        } => {
            out.push_str(&format!(
                "Window: defined by user, t=[{}, {}]\n",
                fmt_f64(*start_time),
                fmt_f64(*stop_time)
            ));
            out.push_str(&format_stats_line("trimmed  ", trimmed));
        }
        SummaryOutcome::InsufficientData { params } => {
            out.push_str(&format!(
                "Window: none (needs more than {} segments)\n",
                params.min_segments
            ));
        }
    }
    out.push_str(&format_stats_line("untrimmed", &summary.untrimmed));

    out
}

/// Format the table of all vials processed in a run.
pub fn format_run_table(summaries: &[SampleSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<20} {:<18} {:>10} {:>10} {:>6} {:>10}\n",
        "vial", "sample", "outcome", "median", "mean", "n", "untrimmed"
    ));

    for s in summaries {
        let trimmed = s.outcome.trimmed().copied().unwrap_or_else(RateStats::empty);
        out.push_str(&format!(
            "{:<6} {:<20} {:<18} {:>10} {:>10} {:>6} {:>10}\n",
            s.vial,
            truncate(&s.sample_name, 20),
            s.outcome.label(),
            fmt_f64(trimmed.median),
            fmt_f64(trimmed.mean),
            trimmed.count,
            fmt_f64(s.untrimmed.median),
        ));
    }

    out
}

fn format_stats_line(label: &str, stats: &RateStats) -> String {
    format!(
        "{label}: median={} mean={} std={} n={}\n",
        fmt_f64(stats.median),
        fmt_f64(stats.mean),
        fmt_f64(stats.std_dev),
        stats.count
    )
}

fn fmt_f64(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else {
        format!("{v}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
