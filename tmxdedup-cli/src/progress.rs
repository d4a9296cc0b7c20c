//! Progress reporting

use std::io;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tmxdedup_core::ChunkSource;

/// Byte-level progress reporter for pipeline runs
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
        }
    }

    /// Initialize the bar for `passes` streaming passes over `file_len` bytes
    pub fn init_bytes(&mut self, file_len: u64, passes: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(file_len.saturating_mul(passes));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Record bytes read from the source
    pub fn advance(&self, bytes: u64) {
        if let Some(pb) = &self.progress_bar {
            pb.inc(bytes);
        }
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("Complete");
        }
    }
}

/// Chunk source decorator that ticks the progress bar as bytes are read
pub struct ProgressSource<'a, S: ChunkSource> {
    inner: &'a mut S,
    reporter: &'a ProgressReporter,
}

impl<'a, S: ChunkSource> ProgressSource<'a, S> {
    /// Wrap a chunk source with progress reporting
    pub fn new(inner: &'a mut S, reporter: &'a ProgressReporter) -> Self {
        Self { inner, reporter }
    }
}

impl<S: ChunkSource> ChunkSource for ProgressSource<'_, S> {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn read(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let chunk = self.inner.read(offset, len)?;
        self.reporter.advance(chunk.len() as u64);
        Ok(chunk)
    }
}
