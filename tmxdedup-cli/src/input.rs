//! File-backed chunk sourcing

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use tmxdedup_core::ChunkSource;

/// Chunk source over a seekable file
///
/// The length is captured at open time; the pipeline assumes the file does
/// not change underneath it.
#[derive(Debug)]
pub struct FileChunkSource {
    file: File,
    len: u64,
}

impl FileChunkSource {
    /// Open a file for chunked reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("failed to stat input file: {}", path.display()))?
            .len();
        Ok(Self { file, len })
    }
}

impl ChunkSource for FileChunkSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}
