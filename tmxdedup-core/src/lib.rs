//! Streaming deduplication for TMX translation memories
//!
//! This crate ingests a translation-memory interchange file, finds units
//! that are duplicates under a configurable equivalence rule, resolves each
//! duplicate group to a single survivor via a deterministic priority policy,
//! and re-emits the file with the losers removed. Memory use stays bounded
//! throughout, so files far larger than RAM can be processed.
//!
//! The pipeline is strictly sequential within one file: chunk source →
//! codec → incremental scanner → grouping engine → priority resolver →
//! streaming writer → output assembler.

#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod grouping;
pub mod key;
mod markup;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod scanner;
pub mod writer;

// Re-export key types
pub use assembler::OutputAssembler;
pub use config::{DedupConfig, MatchConfig, MatchMode, PriorityConfig};
pub use error::{Error, Result};
pub use grouping::{GroupingEngine, GroupingOutput, MemoryEstimate};
pub use key::equivalence_key;
pub use model::{
    Header, HeaderProperty, ResolvedUnit, TranslationUnit, UnitAttrs, UnitStatus, UnitVerdict,
    Variant,
};
pub use pipeline::{
    AnalysisReport, CancelToken, ChunkSource, Codec, DedupPipeline, DedupReport, EncodingTag,
    Utf8Codec,
};
pub use resolve::resolve;
pub use scanner::{ScanOutput, Scanner};
pub use writer::StreamingWriter;
