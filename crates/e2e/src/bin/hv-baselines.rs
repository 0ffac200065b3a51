//! Screenshot baseline maintenance
//!
//! Baselines are versioned artifacts; this tool lists them, adopts fresh
//! screenshots as new baselines after a reviewed visual change, and cleans
//! stale diff images.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use helioviewer_harness::visual::{VisualConfig, VisualTester};

#[derive(Parser, Debug)]
#[command(name = "hv-baselines")]
#[command(about = "Maintain visual regression baselines for the Helioviewer E2E suite")]
struct Args {
    /// Directory containing baseline screenshots
    #[arg(long, default_value = "test-results/baselines")]
    baselines: PathBuf,

    /// Directory containing actual screenshots from the latest run
    #[arg(long, default_value = "test-results/screenshots")]
    actuals: PathBuf,

    /// Directory for diff images
    #[arg(long, default_value = "test-results/diffs")]
    diffs: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored baselines
    List,

    /// Adopt actual screenshots as new baselines
    Update {
        /// Baseline name (file stem); updates every actual when omitted
        name: Option<String>,
    },

    /// Remove stale diff images
    CleanDiffs,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let tester = match VisualTester::new(VisualConfig {
        baseline_dir: args.baselines,
        actual_dir: args.actuals,
        diff_dir: args.diffs,
        ..VisualConfig::default()
    }) {
        Ok(tester) => tester,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let result = match args.command {
        Command::List => tester.list_baselines().map(|names| {
            if names.is_empty() {
                println!("no baselines stored");
            }
            for name in names {
                println!("{name}");
            }
        }),
        Command::Update { name } => match name {
            Some(name) => tester.update_baseline(&name),
            None => tester.list_actuals().and_then(|names| {
                for name in &names {
                    tester.update_baseline(name)?;
                    println!("updated {name}");
                }
                Ok(())
            }),
        },
        Command::CleanDiffs => tester.clean_diffs().map(|removed| {
            println!("removed {removed} diff image(s)");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
