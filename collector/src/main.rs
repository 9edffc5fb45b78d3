use std::path::PathBuf;

use clap::Parser;
use commands::Command;

pub use color_eyre::Result;

mod commands;
mod storage;

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    /// Root of the data directory. Posts are stored under `<data-dir>/tweets`.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[clap(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> Result<()> {
    tracing_common::setup_tracing("collector")?;

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run(&cli.data_dir).await
}
