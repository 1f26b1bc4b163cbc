//! Line-based prompts for the interactive session.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompter asks the questions of a run set up at the terminal
//!
//! Invalid answers are reported and asked again; end of input is an error
//! (exit code 2), so a piped session never loops forever.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::domain::WindowParams;
use crate::error::AppError;

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output sink (captured transcripts in tests).
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a line (reports, plots) on the prompt's output.
    pub fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}")
            .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))
    }

    /// Ask a question and return the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String, AppError> {
        write!(self.output, "{question} ")
            .and_then(|_| self.output.flush())
            .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))?;

        let mut answer = String::new();
        let bytes = self
            .input
            .read_line(&mut answer)
            .map_err(|e| AppError::io(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::io(
                "No input received. Pass --vials and --labels to run unattended.",
            ));
        }
        Ok(answer.trim().to_string())
    }

    /// Ask until the answer is one of `choices` (case-insensitive); returns its index.
    pub fn choose(&mut self, question: &str, choices: &[&str]) -> Result<usize, AppError> {
        loop {
            let answer = self.ask(question)?;
            if let Some(idx) = choices.iter().position(|c| c.eq_ignore_ascii_case(&answer)) {
                return Ok(idx);
            }
            self.say(&format!("Please answer {}.", choices.join(" or ")))?;
        }
    }

    /// Ask until the answer parses. An empty answer takes `default` when given.
    pub fn number<T>(&mut self, question: &str, default: Option<T>) -> Result<T, AppError>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let question = match default {
            Some(d) => format!("{question} [{d}]"),
            None => question.to_string(),
        };
        loop {
            let answer = self.ask(&question)?;
            if answer.is_empty() {
                if let Some(d) = default {
                    return Ok(d);
                }
            } else if let Ok(value) = answer.parse::<T>() {
                return Ok(value);
            }
            self.say(&format!("'{answer}' is not a valid number."))?;
        }
    }

    /// Ask until the answer is not empty.
    pub fn text(&mut self, question: &str) -> Result<String, AppError> {
        loop {
            let answer = self.ask(question)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("Please enter a value.")?;
        }
    }

    /// Whether every vial should be reviewed before it is accepted.
    pub fn review_mode(&mut self) -> Result<bool, AppError> {
        let idx = self.choose("Would you like to review each vial? (yes/no)", &["yes", "no", "y", "n"])?;
        Ok(idx % 2 == 0)
    }

    /// Vials to analyze, either a consecutive range or an explicit list.
    pub fn vials(&mut self) -> Result<Vec<u32>, AppError> {
        let consecutive = self.choose(
            "Are the vials consecutive or a list? (consecutive/list)",
            &["consecutive", "list"],
        )? == 0;

        if consecutive {
            loop {
                let first: u32 = self.number("First vial:", None)?;
                let last: u32 = self.number("Last vial:", None)?;
                if last >= first {
                    return Ok((first..=last).collect());
                }
                self.say("The last vial must not come before the first.")?;
            }
        }

        loop {
            let answer = self.text("Vial numbers (comma-separated):")?;
            match parse_list::<u32>(&answer) {
                Some(vials) if !vials.is_empty() => return Ok(vials),
                _ => self.say(&format!("'{answer}' is not a list of vial numbers."))?,
            }
        }
    }

    /// Sample labels, one per vial, comma-separated.
    pub fn labels(&mut self, vial_count: usize) -> Result<Vec<String>, AppError> {
        let answer = self.text(&format!("Sample names for the {vial_count} vial(s) (comma-separated):"))?;
        Ok(answer.split(',').map(|s| s.trim().to_string()).collect())
    }

    /// Summary file name (without `.csv`).
    pub fn output_name(&mut self) -> Result<String, AppError> {
        self.text("Name of the output file (without .csv):")
    }

    /// `true` when the user accepts the current window.
    pub fn happy(&mut self) -> Result<bool, AppError> {
        Ok(self.choose("Are you happy or sad with this window? (happy/sad)", &["happy", "sad"])? == 0)
    }

    /// `true` when the user wants to pick the window by hand.
    pub fn myself(&mut self) -> Result<bool, AppError> {
        Ok(self.choose(
            "Pick the window yourself or let the computer retry? (myself/computer)",
            &["myself", "computer"],
        )? == 0)
    }

    /// Start and stop time of a hand-picked window.
    pub fn manual_window(&mut self) -> Result<(f64, f64), AppError> {
        loop {
            let start: f64 = self.number("Start time of the window (h):", None)?;
            let stop: f64 = self.number("Stop time of the window (h):", None)?;
            if start <= stop {
                return Ok((start, stop));
            }
            self.say("The stop time must not come before the start time.")?;
        }
    }

    /// New search parameters. Empty answers keep the previous value.
    pub fn relaxed_params(&mut self, current: &WindowParams) -> Result<WindowParams, AppError> {
        let mut draft = *current;
        loop {
            draft.min_segments = self.number("Minimum pump events required:", Some(draft.min_segments))?;
            draft.window_size = self.number("Initial window size (odd):", Some(draft.window_size))?;
            draft.residual_tolerance = self.number("Residuals allowed:", Some(draft.residual_tolerance))?;
            match draft.validate() {
                Ok(()) => return Ok(draft),
                Err(err) => self.say(err.message())?,
            }
        }
    }
}

fn parse_list<T: FromStr>(raw: &str) -> Option<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn choose_reprompts_until_valid() {
        let mut p = prompter("maybe\nSAD\n");
        assert!(!p.happy().unwrap());
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("Please answer happy or sad."));
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut p = prompter("");
        let err = p.review_mode().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn consecutive_vials_are_expanded() {
        let mut p = prompter("consecutive\n5\n3\n3\n5\n");
        assert_eq!(p.vials().unwrap(), vec![3, 4, 5]);
    }

    #[test]
    fn vial_list_is_parsed() {
        let mut p = prompter("list\n1, x\n1, 4 ,9\n");
        assert_eq!(p.vials().unwrap(), vec![1, 4, 9]);
    }

    #[test]
    fn labels_are_split_and_trimmed() {
        let mut p = prompter("wt , mutant A\n");
        assert_eq!(p.labels(2).unwrap(), vec!["wt", "mutant A"]);
    }

    #[test]
    fn relaxed_params_take_defaults_and_revalidate() {
        let current = WindowParams::default();
        let mut p = prompter("5\n4\n\n\n7\n2.5\n");
        let params = p.relaxed_params(&current).unwrap();
        assert_eq!(params.min_segments, 5);
        assert_eq!(params.window_size, 7);
        assert_eq!(params.residual_tolerance, 2.5);
    }

    #[test]
    fn manual_window_rejects_inverted_times() {
        let mut p = prompter("10\n2\n2\n10\n");
        assert_eq!(p.manual_window().unwrap(), (2.0, 10.0));
    }
}
