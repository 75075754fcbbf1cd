//! functest - sequential functional test runner
//!
//! Runs scenario cases one at a time against a remote service, polling each
//! for completion once per tick and failing the whole run on timeout.

use clap::Parser;
use functest::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "functest", about = "Tick-driven functional test runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
