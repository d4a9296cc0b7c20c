//! Configuration types for the deduplication pipeline
//!
//! Every memory ceiling and matching rule lives here and is passed into the
//! components explicitly; no component reads tuning state from anywhere else.

use serde::{Deserialize, Serialize};

/// Which segment text defines duplicate equivalence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Source segments must be equal
    SourceEqual,
    /// Target segments must be equal
    TargetEqual,
    /// Both segments must be equal
    #[default]
    BothEqual,
}

/// Rules governing which units count as duplicates of each other
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Which side(s) of the unit participate in the key
    pub match_mode: MatchMode,
    /// Compare text without case folding
    pub case_sensitive: bool,
    /// Collapse whitespace runs and trim before comparing
    pub ignore_whitespace: bool,
    /// Strip `. , ! ? ; :` before comparing
    pub ignore_punctuation: bool,
}

/// Rules governing which member of a duplicate group survives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Privileged creation ids, highest priority first
    pub creation_ids: Vec<String>,
    /// Privileged change ids, highest priority first
    pub change_ids: Vec<String>,
    /// Prefer the lexicographically latest change date
    pub prefer_latest_change_date: bool,
    /// Prefer the lexicographically latest creation date
    pub prefer_latest_creation_date: bool,
    /// Try date comparisons before id-list comparisons
    pub date_first: bool,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            creation_ids: Vec::new(),
            change_ids: Vec::new(),
            prefer_latest_change_date: true,
            prefer_latest_creation_date: true,
            date_first: false,
        }
    }
}

/// Full pipeline configuration
///
/// Holds the match and priority rules plus every resource knob. The knobs
/// are independent: batch ceiling bounds the grouping engine, the flush
/// threshold bounds the writer, the blob cap bounds the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Duplicate equivalence rules
    pub match_config: MatchConfig,
    /// Survivor selection rules
    pub priority_config: PriorityConfig,
    /// Source language token; `None` uses the header's `srclang`
    pub source_lang: Option<String>,
    /// Target language token; `None` uses the unit's non-source variant
    pub target_lang: Option<String>,
    /// Estimated bytes a pending batch may hold before it is flushed
    pub batch_memory_ceiling: usize,
    /// Lower clamp for the adaptive batch member target
    pub batch_floor: usize,
    /// Purge singleton groups every this many flushes
    pub purge_interval: u32,
    /// Writer accumulates this many bytes of text before emitting a chunk
    pub writer_flush_threshold: usize,
    /// Maximum size of an assembled output blob
    pub output_blob_cap: usize,
    /// Bytes requested from the chunk source per read
    pub read_chunk_size: usize,
    /// Leading bytes handed to the codec for encoding detection
    pub detect_sample_size: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            priority_config: PriorityConfig::default(),
            source_lang: None,
            target_lang: None,
            batch_memory_ceiling: 8 * 1024 * 1024, // 8MB of estimated strings
            batch_floor: 64,
            purge_interval: 4,
            writer_flush_threshold: 256 * 1024,
            output_blob_cap: 4 * 1024 * 1024,
            read_chunk_size: 64 * 1024,
            detect_sample_size: 8 * 1024,
        }
    }
}

impl DedupConfig {
    /// Create a configuration tuned for tightly constrained memory
    pub fn low_memory() -> Self {
        Self {
            batch_memory_ceiling: 1024 * 1024, // 1MB
            batch_floor: 16,
            purge_interval: 2,
            writer_flush_threshold: 32 * 1024,
            output_blob_cap: 512 * 1024,
            read_chunk_size: 16 * 1024,
            ..Self::default()
        }
    }

    /// Validate knob relationships that the components rely on
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.batch_memory_ceiling == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "batch_memory_ceiling must be non-zero".into(),
            ));
        }
        if self.batch_floor == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "batch_floor must be non-zero".into(),
            ));
        }
        if self.purge_interval == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "purge_interval must be non-zero".into(),
            ));
        }
        if self.read_chunk_size == 0 || self.writer_flush_threshold == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "chunk sizes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DedupConfig::default().validate().is_ok());
        assert!(DedupConfig::low_memory().validate().is_ok());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let config = DedupConfig {
            batch_memory_ceiling: 0,
            ..DedupConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn match_config_deserializes_with_partial_fields() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"match_mode": "source_equal"}"#).unwrap();
        assert_eq!(config.match_mode, MatchMode::SourceEqual);
        assert!(!config.case_sensitive);
    }
}
