//! Process command implementation

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tmxdedup_core::DedupPipeline;

use crate::codec::EncodingCodec;
use crate::config::RuleArgs;
use crate::input::FileChunkSource;
use crate::output::write_atomic;
use crate::progress::{ProgressReporter, ProgressSource};
use crate::report::render_run_text;

/// Arguments for the process command
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input TMX file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

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

impl ProcessArgs {
    /// Execute the process command
    pub fn execute(&self) -> Result<()> {
        super::init_logging(self.quiet, self.verbose);

        log::info!("Deduplicating {}", self.input.display());
        log::debug!("Arguments: {:?}", self);

        let config = self.rules.build_config()?;
        let pipeline = DedupPipeline::new(config)?;

        let mut source = FileChunkSource::open(&self.input)?;
        let file_len = tmxdedup_core::ChunkSource::len(&source);

        // The pipeline streams the file twice: analysis, then rewrite
        let mut reporter = ProgressReporter::new(self.quiet || self.output.is_none());
        reporter.init_bytes(file_len, 2);

        let mut tracked = ProgressSource::new(&mut source, &reporter);
        let report = pipeline.run(&mut tracked, &EncodingCodec)?;
        reporter.finish();

        match &self.output {
            Some(path) => {
                write_atomic(path, &report.blobs)?;
                log::info!("Wrote {}", path.display());
            }
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                for blob in &report.blobs {
                    handle.write_all(blob).context("failed to write to stdout")?;
                }
            }
        }

        if self.output.is_some() {
            print!("{}", render_run_text(&report));
        } else {
            eprint!("{}", render_run_text(&report));
        }

        Ok(())
    }
}
