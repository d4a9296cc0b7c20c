//! Output chunk assembly
//!
//! Merges the writer's ordered chunks into size-capped aggregate blobs
//! without reordering; the concatenation of the blobs is byte-identical to
//! the concatenation of the input chunks.

/// Assembler for combining output chunks
#[derive(Debug, Clone, Copy)]
pub struct OutputAssembler {
    cap: usize,
}

impl OutputAssembler {
    /// Create an assembler with the given blob size cap
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    /// Merge ordered chunks into blobs of at most `cap` bytes
    ///
    /// A single chunk already larger than the cap passes through alone.
    /// Merge passes repeat until no pass can combine further neighbors.
    pub fn assemble(&self, chunks: Vec<String>) -> Vec<String> {
        let mut blobs = chunks;
        loop {
            let before = blobs.len();
            blobs = self.merge_pass(blobs);
            if blobs.len() == before {
                return blobs;
            }
        }
    }

    fn merge_pass(&self, chunks: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for chunk in chunks {
            match out.last_mut() {
                Some(last) if !last.is_empty() && last.len() + chunk.len() <= self.cap => {
                    last.push_str(&chunk);
                }
                _ => out.push(chunk),
            }
        }
        out
    }
}
