//! Benchmark harness executable for kernelbench.

use anyhow::Result;
use clap::Parser;
use kernelbench_runner::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
