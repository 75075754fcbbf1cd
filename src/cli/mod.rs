//! CLI command handling
//!
//! Builds the run from configuration, drives the scheduler and prints the
//! verdict.

use std::time::Duration;

use colored::Colorize;

use crate::commands::{Commands, RunArgs};
use crate::common::config::RunConfig;
use crate::common::Result;
use crate::remote::{ApiClient, EventListener};
use crate::scheduler::{RunOutcome, Scheduler, TickClock};
use crate::testing::ScenarioLoader;

/// How long a run waits for the event stream before the first tick
const STREAM_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run(args) => run(&args).await,
        Commands::List(args) => list(&args),
        Commands::Check(args) => check(&args),
    }
}

/// Load configuration and apply command line overrides
pub fn load_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = RunConfig::load(args.config.as_deref())?;
    config.apply(args.overrides());
    config.validate()?;
    Ok(config)
}

async fn run(args: &RunArgs) -> Result<i32> {
    let config = load_config(args)?;

    println!(
        "\n{} {} case(s) against {}",
        "Running:".blue().bold(),
        config.cases.len(),
        config.endpoint.white().bold()
    );
    tracing::debug!(
        timeout = config.timeout,
        tick_period_ms = config.tick_period_ms,
        cases_dir = %config.cases_dir.display(),
        "Run configuration"
    );

    let client = ApiClient::new(&config.endpoint_url()?)?;
    let events = EventListener::new(config.events_url()?);
    let stream = events
        .connect(client.http().clone(), STREAM_READY_TIMEOUT)
        .await;
    let loader = ScenarioLoader::new(&config.cases_dir);

    let mut clock = TickClock::start(config.tick_period())?;
    let mut scheduler = Scheduler::new(config, loader, client, events);
    let result = scheduler.run(&mut clock).await;
    stream.abort();

    let outcome = result?;
    report(&outcome);
    Ok(outcome.exit_code())
}

/// Print the single terminal message of a run
fn report(outcome: &RunOutcome) {
    match outcome.error() {
        None => {
            let cases = match outcome {
                RunOutcome::Finished { cases } => *cases,
                _ => 0,
            };
            println!(
                "\n{} {} ({} case(s))\n",
                "✓".green().bold(),
                "Tests execution completed".green().bold(),
                cases
            );
        }
        Some(err) => {
            let headline = match outcome {
                RunOutcome::TimedOut { .. } => "Timed out!",
                RunOutcome::Aborted { .. } => "Run aborted:",
                _ => "Run failed:",
            };
            eprintln!("\n{} {} {}\n", "✗".red().bold(), headline.red().bold(), err);
        }
    }
}

fn list(args: &RunArgs) -> Result<i32> {
    let config = load_config(args)?;
    let loader = ScenarioLoader::new(&config.cases_dir);

    if config.cases.is_empty() {
        println!("No cases configured");
    } else {
        println!("Configured cases:");
        for (i, id) in config.cases.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, id);
        }
    }

    match loader.available() {
        Ok(ids) if ids.is_empty() => {
            println!("No scenario files in {}", loader.dir().display());
        }
        Ok(ids) => {
            println!("Scenarios in {}:", loader.dir().display());
            for id in ids {
                println!("  {}", id);
            }
        }
        Err(e) => {
            println!(
                "Cannot read scenario directory {}: {}",
                loader.dir().display(),
                e
            );
        }
    }

    Ok(0)
}

fn check(args: &RunArgs) -> Result<i32> {
    let config = load_config(args)?;
    let loader = ScenarioLoader::new(&config.cases_dir);

    let mut failures = 0;
    for id in &config.cases {
        match loader.load_scenario(id) {
            Ok(scenario) => println!(
                "  {} {} {} ({} steps)",
                "✓".green(),
                id,
                scenario.name.dimmed(),
                scenario.steps.len()
            ),
            Err(e) => {
                failures += 1;
                println!("  {} {}", "✗".red(), e);
            }
        }
    }

    if failures == 0 {
        println!("\n{} {} case(s) resolved", "✓".green().bold(), config.cases.len());
        Ok(0)
    } else {
        println!("\n{} {} case(s) failed to load", "✗".red().bold(), failures);
        Ok(1)
    }
}
