//! Per-vial review loop.
//!
//! Every vial moves through an explicit state machine:
//!
//! ```text
//! Fitting ──► AwaitingReview ──► Accepted
//!    ▲              │
//!    └── Relax ─────┤
//!                   └── Manual ──► AwaitingReview
//! ```
//!
//! - `Fitting` runs the automatic window search with the current parameters
//!   (or records insufficient data).
//! - `AwaitingReview` hands the result to a [`ReviewPolicy`] and applies its
//!   decision.
//! - The loop is bounded by [`ReviewPolicy::max_rounds`]; once exhausted the
//!   latest result is accepted.
//!
//! Front-ends plug in different policies: [`AcceptAll`] for unattended runs,
//! an interactive prompt policy for review sessions, closures in tests.

use log::{info, warn};

use crate::domain::{GrowthRateSeries, SampleSummary, WindowParams, WindowSelection};
use crate::error::AppError;
use crate::fit::{SegmentFit, find_window_with, select_by_time};
use crate::report::summarize;

/// Default bound on review rounds per vial.
pub const DEFAULT_MAX_ROUNDS: usize = 20;

/// Where a vial is in its review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VialState {
    Fitting,
    AwaitingReview,
    Accepted,
}

/// What the reviewer wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewDecision {
    /// Keep the current result.
    Accept,
    /// Re-run the automatic search with different parameters.
    Relax(WindowParams),
    /// Use the growth rates between two times instead.
    Manual { start_time: f64, stop_time: f64 },
}

/// Everything a reviewer gets to see in one round.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRound<'a> {
    pub vial: u32,
    pub sample_name: &'a str,
    /// 1-based round counter.
    pub round: usize,
    pub fit: &'a SegmentFit,
    pub params: &'a WindowParams,
    pub selection: &'a WindowSelection,
    pub summary: &'a SampleSummary,
}

/// Decides what to do with each round's result.
pub trait ReviewPolicy {
    fn review(&mut self, round: &ReviewRound<'_>) -> Result<ReviewDecision, AppError>;

    /// Maximum number of decisions requested per vial.
    fn max_rounds(&self) -> usize {
        DEFAULT_MAX_ROUNDS
    }
}

/// Accepts every result as-is (unattended runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ReviewPolicy for AcceptAll {
    fn review(&mut self, _round: &ReviewRound<'_>) -> Result<ReviewDecision, AppError> {
        Ok(ReviewDecision::Accept)
    }
}

impl<F> ReviewPolicy for F
where
    F: FnMut(&ReviewRound<'_>) -> Result<ReviewDecision, AppError>,
{
    fn review(&mut self, round: &ReviewRound<'_>) -> Result<ReviewDecision, AppError> {
        self(round)
    }
}

/// Final state of a reviewed vial.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub selection: WindowSelection,
    pub summary: SampleSummary,
    pub params: WindowParams,
    /// Number of results presented to the reviewer.
    pub rounds: usize,
}

/// Run the automatic window search, or record that the series is too short.
pub fn select_window(series: &GrowthRateSeries, params: &WindowParams) -> WindowSelection {
    if !params.has_enough_segments(series.len()) {
        return WindowSelection::Insufficient { params: *params };
    }
    match find_window_with(series, params) {
        Some(window) => WindowSelection::Automatic {
            window,
            params: *params,
        },
        None => WindowSelection::Insufficient { params: *params },
    }
}

/// Drive one vial from fitting to acceptance.
///
/// `present` is called with every result before the policy sees it (figure
/// rendering, terminal output). Relaxed parameters are validated; invalid ones
/// abort the run.
pub fn review_vial(
    vial: u32,
    sample_name: &str,
    fit: &SegmentFit,
    params: WindowParams,
    policy: &mut dyn ReviewPolicy,
    mut present: impl FnMut(&ReviewRound<'_>) -> Result<(), AppError>,
) -> Result<ReviewOutcome, AppError> {
    let series = &fit.series;
    let mut params = params;
    let mut selection = WindowSelection::Insufficient { params };
    let mut summary = summarize(sample_name, vial, series, &selection);
    let mut rounds = 0usize;
    let mut state = VialState::Fitting;

    while state != VialState::Accepted {
        state = match state {
            VialState::Fitting => {
                selection = select_window(series, &params);
                summary = summarize(sample_name, vial, series, &selection);
                VialState::AwaitingReview
            }
            VialState::AwaitingReview => {
                rounds += 1;
                let round = ReviewRound {
                    vial,
                    sample_name,
                    round: rounds,
                    fit,
                    params: &params,
                    selection: &selection,
                    summary: &summary,
                };
                present(&round)?;

                if rounds > policy.max_rounds() {
                    warn!(
                        "vial {vial}: review limit of {} rounds reached, keeping the latest result",
                        policy.max_rounds()
                    );
                    VialState::Accepted
                } else {
                    match policy.review(&round)? {
                        ReviewDecision::Accept => VialState::Accepted,
                        ReviewDecision::Relax(relaxed) => {
                            relaxed.validate()?;
                            info!(
                                "vial {vial}: retrying with min segments={}, window size={}, residuals allowed={}",
                                relaxed.min_segments, relaxed.window_size, relaxed.residual_tolerance
                            );
                            params = relaxed;
                            VialState::Fitting
                        }
                        ReviewDecision::Manual {
                            start_time,
                            stop_time,
                        } => {
                            selection = WindowSelection::Manual {
                                range: select_by_time(series, start_time, stop_time),
                                start_time,
                                stop_time,
                            };
                            summary = summarize(sample_name, vial, series, &selection);
                            VialState::AwaitingReview
                        }
                    }
                }
            }
            VialState::Accepted => VialState::Accepted,
        };
    }

    Ok(ReviewOutcome {
        selection,
        summary,
        params,
        rounds,
    })
}
