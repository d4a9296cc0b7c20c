//! Analyze command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tmxdedup_core::DedupPipeline;

use crate::codec::EncodingCodec;
use crate::config::RuleArgs;
use crate::input::FileChunkSource;
use crate::progress::{ProgressReporter, ProgressSource};
use crate::report::{render_analysis_json, render_analysis_text};

/// Arguments for the analyze command
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input TMX file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Matching and priority rules
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Supported report formats
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary with one verdict per line
    Text,
    /// JSON document with counts and per-unit verdicts
    Json,
}

impl AnalyzeArgs {
    /// Execute the analyze command
    pub fn execute(&self) -> Result<()> {
        super::init_logging(self.quiet, self.verbose);

        log::info!("Analyzing {}", self.input.display());

        let config = self.rules.build_config()?;
        let pipeline = DedupPipeline::new(config)?;

        let mut source = FileChunkSource::open(&self.input)?;
        let file_len = tmxdedup_core::ChunkSource::len(&source);

        let mut reporter = ProgressReporter::new(self.quiet);
        reporter.init_bytes(file_len, 1);

        let mut tracked = ProgressSource::new(&mut source, &reporter);
        let report = pipeline.analyze(&mut tracked, &EncodingCodec)?;
        reporter.finish();

        let rendered = match self.format {
            ReportFormat::Text => render_analysis_text(&report),
            ReportFormat::Json => render_analysis_json(&report)?,
        };
        println!("{rendered}");

        Ok(())
    }
}
