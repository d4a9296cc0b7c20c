//! Binary entry point for the tmxdedup CLI

use clap::Parser;
use tmxdedup_cli::commands::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.execute() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
