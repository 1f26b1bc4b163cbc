//! Terminal review of each vial's window.

use std::io::{BufRead, Write};

use crate::cli::prompt::Prompter;
use crate::error::AppError;
use crate::plot::render_growth_plot;
use crate::report::format_vial_report;
use crate::review::{DEFAULT_MAX_ROUNDS, ReviewDecision, ReviewPolicy, ReviewRound};

/// [`ReviewPolicy`] that shows the result and asks happy/sad.
pub struct InteractiveReview<'p, R, W> {
    prompter: &'p mut Prompter<R, W>,
    max_rounds: usize,
    plot_size: (usize, usize),
}

impl<'p, R: BufRead, W: Write> InteractiveReview<'p, R, W> {
    pub fn new(prompter: &'p mut Prompter<R, W>) -> Self {
        Self {
            prompter,
            max_rounds: DEFAULT_MAX_ROUNDS,
            plot_size: (72, 16),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_plot_size(mut self, width: usize, height: usize) -> Self {
        self.plot_size = (width, height);
        self
    }
}

impl<R: BufRead, W: Write> ReviewPolicy for InteractiveReview<'_, R, W> {
    fn review(&mut self, round: &ReviewRound<'_>) -> Result<ReviewDecision, AppError> {
        let series = &round.fit.series;
        let (width, height) = self.plot_size;

        self.prompter
            .say(&format_vial_report(round.summary, round.fit.dropped_segments))?;
        self.prompter.say(&render_growth_plot(
            series,
            round.selection.index_range(series.len()),
            width,
            height,
        ))?;

        if self.prompter.happy()? {
            return Ok(ReviewDecision::Accept);
        }
        if self.prompter.myself()? {
            let (start_time, stop_time) = self.prompter.manual_window()?;
            return Ok(ReviewDecision::Manual {
                start_time,
                stop_time,
            });
        }
        Ok(ReviewDecision::Relax(self.prompter.relaxed_params(round.params)?))
    }

    fn max_rounds(&self) -> usize {
        self.max_rounds
    }
}
