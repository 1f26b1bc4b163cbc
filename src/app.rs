//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - gathers the run setup from flags or an interactive session
//! - runs the per-vial pipeline and writes the summary outputs

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::cli::interactive::InteractiveReview;
use crate::cli::prompt::Prompter;
use crate::cli::{AnalyzeArgs, Cli, Command, SimulateArgs};
use crate::data::{SimConfig, write_simulated_run};
use crate::domain::SampleSummary;
use crate::error::AppError;
use crate::io::{VialRecord, summary_path};
use crate::report::format_run_table;
use crate::review::AcceptAll;

pub mod pipeline;

use pipeline::{RunConfig, VialJob, analyze_run, build_jobs, write_run_outputs};

/// Summary name used by unattended runs without `--output`.
const DEFAULT_OUTPUT_NAME: &str = "growth_rates";

/// Entry point for the `odgrowth` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level())).init();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    config.params.validate()?;

    if args.needs_session() || args.interactive {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        return run_session(&args, &config, &mut prompter);
    }

    let vials = args.vial_numbers().unwrap_or_default();
    let jobs = build_jobs(&vials, &args.labels)?;
    let records = analyze_run(&jobs, &config, &mut AcceptAll)?;

    let name = args.output.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME);
    finish_run(&records, &config, name, args.manifest.clone())
}

/// Interactive session: prompt for whatever the flags left open, then review.
fn run_session<R: BufRead, W: Write>(
    args: &AnalyzeArgs,
    config: &RunConfig,
    prompter: &mut Prompter<R, W>,
) -> Result<(), AppError> {
    let (review, vials) = match args.vial_numbers() {
        Some(vials) => (true, vials),
        None => {
            let review = prompter.review_mode()?;
            (review, prompter.vials()?)
        }
    };
    let labels = if args.labels.is_empty() {
        prompter.labels(vials.len())?
    } else {
        args.labels.clone()
    };
    let jobs: Vec<VialJob> = build_jobs(&vials, &labels)?;

    let records = if review {
        let mut policy = InteractiveReview::new(prompter)
            .with_max_rounds(args.max_rounds)
            .with_plot_size(args.width, args.height);
        analyze_run(&jobs, config, &mut policy)?
    } else {
        analyze_run(&jobs, config, &mut AcceptAll)?
    };

    let name = match &args.output {
        Some(name) => name.clone(),
        None => prompter.output_name()?,
    };
    finish_run(&records, config, &name, args.manifest.clone())
}

fn finish_run(
    records: &[VialRecord],
    config: &RunConfig,
    name: &str,
    manifest: Option<PathBuf>,
) -> Result<(), AppError> {
    let summary_csv = config.data_dir.join(summary_path(name));
    write_run_outputs(records, config, &summary_csv, manifest.as_deref())?;

    let summaries: Vec<SampleSummary> = records.iter().map(|r| r.summary.clone()).collect();
    println!("{}", format_run_table(&summaries));
    println!("Summary written to {}", summary_csv.display());
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = sim_config_from_args(&args);
    let written = write_simulated_run(&args.out_dir, &args.vials, &config)?;
    info!("simulated {} vial(s) into {}", args.vials.len(), args.out_dir.display());
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn run_config_from_args(args: &AnalyzeArgs) -> RunConfig {
    let figures_dir = if args.no_figures {
        None
    } else {
        Some(args.figures_dir.clone().unwrap_or_else(|| args.data_dir.clone()))
    };
    RunConfig {
        data_dir: args.data_dir.clone(),
        figures_dir,
        params: args.window_params(),
    }
}

pub fn sim_config_from_args(args: &SimulateArgs) -> SimConfig {
    SimConfig {
        rate: args.rate,
        noise: args.noise,
        hours: args.hours,
        interval: args.interval_minutes / 60.0,
        start_od: args.start_od,
        threshold: args.threshold,
        dilute_to: args.dilute_to,
        dropout_prob: args.dropout_prob,
        seed: args.seed,
    }
}
