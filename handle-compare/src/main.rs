use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use handle_compare::{find, run, Scenario, Target, SCENARIOS};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Runs the ownership scenarios against SharedHandle and Rc side by side.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Only run the named scenario (repeatable)
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// Which pointer to exercise
    #[arg(long, value_enum, default_value_t = Target::Both)]
    target: Target,

    /// More output: -v for debug, -vv for the release trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print the scenario names and exit
    #[arg(long)]
    list: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn select(names: &[String]) -> Result<Vec<&'static Scenario>> {
    if names.is_empty() {
        return Ok(SCENARIOS.iter().collect());
    }
    names
        .iter()
        .map(|name| find(name).ok_or_else(|| anyhow!("unknown scenario `{}`, try --list", name)))
        .collect()
}

fn try_main(cli: Cli) -> Result<()> {
    if cli.list {
        for scenario in SCENARIOS {
            println!("{:<24} {}", scenario.name, scenario.about);
        }
        return Ok(());
    }

    let selected = select(&cli.scenarios)?;
    let mut failed = 0;
    for scenario in &selected {
        if let Err(e) = run(scenario, cli.target) {
            error!("{:#}", e);
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(anyhow!("{} of {} scenarios failed", failed, selected.len()));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = try_main(cli) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
