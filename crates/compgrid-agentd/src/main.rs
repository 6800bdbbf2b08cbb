mod app;
mod cli;

use anyhow::Result;
use clap::Parser;

use compgrid_observe::logger_init;

use crate::cli::{Cli, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger_init(&cli.logger_config()?)?;

    match cli.mode() {
        Mode::Shell => app::shell(&cli).await,
        Mode::Serve => app::serve(&cli).await,
        Mode::Compare(args) => app::compare_backends(&cli, &args).await,
    }
}
