//! CLI command implementations

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod analyze;
pub mod process;

/// Deduplicate TMX translation memories
#[derive(Debug, Parser)]
#[command(name = "tmxdedup", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deduplicate a TMX file and write the cleaned output
    Process(process::ProcessArgs),

    /// Report duplicate groups without writing any output
    Analyze(analyze::AnalyzeArgs),
}

impl Cli {
    /// Dispatch to the selected command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Process(args) => args.execute(),
            Commands::Analyze(args) => args.execute(),
        }
    }
}

/// Initialize logging based on verbosity level
pub(crate) fn init_logging(quiet: bool, verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if !quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_args_parse() {
        let cli = Cli::parse_from([
            "tmxdedup",
            "process",
            "-i",
            "memory.tmx",
            "-o",
            "clean.tmx",
            "--match-mode",
            "source-equal",
            "--prefer-creation-id",
            "tm_admin",
        ]);
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.input.to_str(), Some("memory.tmx"));
                assert_eq!(args.rules.prefer_creation_id, vec!["tm_admin"]);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn analyze_args_parse() {
        let cli = Cli::parse_from(["tmxdedup", "analyze", "-i", "memory.tmx", "-f", "json"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert!(matches!(args.format, analyze::ReportFormat::Json));
            }
            _ => panic!("expected analyze command"),
        }
    }
}
