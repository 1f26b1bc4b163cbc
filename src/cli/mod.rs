//! Command-line parsing for the turbidostat growth-rate tool.
//!
//! The goal of this module is to keep **argument parsing** and **prompting**
//! separate from the fitting and windowing code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_MIN_SEGMENTS, DEFAULT_RESIDUAL_TOLERANCE, DEFAULT_WINDOW_SIZE, WindowParams,
};
use crate::review::DEFAULT_MAX_ROUNDS;

pub mod interactive;
pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "odgrowth",
    version,
    about = "Steady-state growth rates from turbidostat OD traces"
)]
pub struct Cli {
    /// Log window-search internals.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Default `env_logger` filter for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit growth rates for a set of vials and write the summary CSV.
    ///
    /// Without `--vials` or `--first/--last` the run is set up interactively.
    Analyze(AnalyzeArgs),
    /// Write synthetic turbidostat files for demos and tests.
    Simulate(SimulateArgs),
}

/// Options of `odgrowth analyze`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Comma-separated vial numbers, e.g. `3,4,7`.
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["first", "last"])]
    pub vials: Vec<u32>,

    /// First vial of a consecutive range.
    #[arg(long, requires = "last")]
    pub first: Option<u32>,

    /// Last vial of a consecutive range (inclusive).
    #[arg(long, requires = "first")]
    pub last: Option<u32>,

    /// Comma-separated sample labels, one per vial.
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Summary file name (`.csv` is appended).
    #[arg(short, long)]
    pub output: Option<String>,

    /// A vial needs more fitted segments than this to be windowed.
    #[arg(long, default_value_t = DEFAULT_MIN_SEGMENTS)]
    pub min_segments: usize,

    /// Size of the flattest-region window (odd, >= 3).
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Multiple of the base residual tolerated while expanding the window.
    #[arg(long, default_value_t = DEFAULT_RESIDUAL_TOLERANCE)]
    pub residual_tolerance: f64,

    /// Directory holding `vial{N}_OD.txt` and `vial{N}_pump_log.txt`.
    #[arg(long, env = "ODGROWTH_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory for per-vial figures (defaults to the data directory).
    #[arg(long, env = "ODGROWTH_FIGURES_DIR")]
    pub figures_dir: Option<PathBuf>,

    /// Also write a JSON manifest with per-vial diagnostics.
    #[arg(long, value_name = "JSON")]
    pub manifest: Option<PathBuf>,

    /// Skip writing SVG figures.
    #[arg(long)]
    pub no_figures: bool,

    /// Review every vial interactively even when vials are given as flags.
    #[arg(short, long)]
    pub interactive: bool,

    /// Review rounds per vial before the latest result is kept.
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,

    /// Preview plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Preview plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,
}

impl AnalyzeArgs {
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            min_segments: self.min_segments,
            window_size: self.window_size,
            residual_tolerance: self.residual_tolerance,
        }
    }

    /// Vials named on the command line, if any.
    pub fn vial_numbers(&self) -> Option<Vec<u32>> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Some((first.min(last)..=first.max(last)).collect()),
            _ if !self.vials.is_empty() => Some(self.vials.clone()),
            _ => None,
        }
    }

    /// Whether the run setup has to be prompted for.
    pub fn needs_session(&self) -> bool {
        self.vial_numbers().is_none()
    }
}

/// Options of `odgrowth simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Comma-separated vial numbers to generate.
    #[arg(long, value_delimiter = ',', default_value = "1")]
    pub vials: Vec<u32>,

    /// Output directory.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// True specific growth rate (1/h).
    #[arg(long, default_value_t = 0.35)]
    pub rate: f64,

    /// Standard deviation of multiplicative OD noise.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Run length (hours).
    #[arg(long, default_value_t = 48.0)]
    pub hours: f64,

    /// Minutes between OD readings.
    #[arg(long, default_value_t = 2.0)]
    pub interval_minutes: f64,

    /// OD at the start of the run.
    #[arg(long, default_value_t = 0.05)]
    pub start_od: f64,

    /// OD that triggers a dilution.
    #[arg(long, default_value_t = 0.3)]
    pub threshold: f64,

    /// OD right after a dilution.
    #[arg(long, default_value_t = 0.2)]
    pub dilute_to: f64,

    /// Probability that a reading is a sensor dropout (`nan`).
    #[arg(long, default_value_t = 0.0)]
    pub dropout_prob: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
