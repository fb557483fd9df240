//! Entry-point for the `tagport` binary.
use std::process::ExitCode;

use clap::Parser;
use tagport_cli::Cli;
use tagport_cli::run_main;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_main(cli))
}
