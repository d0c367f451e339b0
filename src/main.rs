mod cli;
mod filter;
mod model;
mod registry;
mod store;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
