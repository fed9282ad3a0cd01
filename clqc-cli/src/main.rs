//! CLQC CLI - Command line tool for quality-controlling climate observations.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "clqc-cli",
    version,
    about = "Climate QC toolkit: edit observations and reconcile records and aggregates"
)]
struct Cli {
    #[command(subcommand)]
    command: clqc_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    clqc_cmd::run(cli.command)
}
