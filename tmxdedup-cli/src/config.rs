//! CLI-side configuration assembly
//!
//! Builds a [`DedupConfig`] from an optional TOML file plus command-line
//! overrides. Flags always win over file values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tmxdedup_core::{DedupConfig, MatchMode};

/// Matching and priority flags shared by the `process` and `analyze` commands
#[derive(Debug, Args)]
pub struct RuleArgs {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Which segment text defines duplicate equivalence
    #[arg(short, long, value_enum)]
    pub match_mode: Option<MatchModeArg>,

    /// Treat differently cased text as distinct
    #[arg(long)]
    pub case_sensitive: bool,

    /// Collapse whitespace runs before comparing
    #[arg(long)]
    pub ignore_whitespace: bool,

    /// Strip terminal punctuation before comparing
    #[arg(long)]
    pub ignore_punctuation: bool,

    /// Privileged creation id, repeatable, highest priority first
    #[arg(long, value_name = "ID")]
    pub prefer_creation_id: Vec<String>,

    /// Privileged change id, repeatable, highest priority first
    #[arg(long, value_name = "ID")]
    pub prefer_change_id: Vec<String>,

    /// Compare dates before privileged id lists
    #[arg(long)]
    pub date_first: bool,

    /// Source language override (default: the header's srclang)
    #[arg(short, long, value_name = "LANG")]
    pub source_lang: Option<String>,

    /// Target language override (default: the unit's non-source variant)
    #[arg(short, long, value_name = "LANG")]
    pub target_lang: Option<String>,

    /// Use the low-memory tuning preset
    #[arg(long)]
    pub low_memory: bool,

    /// Read chunk size in KB
    #[arg(long, value_name = "KB")]
    pub chunk_kb: Option<usize>,
}

/// Duplicate match modes accepted on the command line
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum MatchModeArg {
    /// Source segments must be equal
    SourceEqual,
    /// Target segments must be equal
    TargetEqual,
    /// Both segments must be equal
    BothEqual,
}

impl From<MatchModeArg> for MatchMode {
    fn from(mode: MatchModeArg) -> Self {
        match mode {
            MatchModeArg::SourceEqual => MatchMode::SourceEqual,
            MatchModeArg::TargetEqual => MatchMode::TargetEqual,
            MatchModeArg::BothEqual => MatchMode::BothEqual,
        }
    }
}

impl RuleArgs {
    /// Assemble the pipeline configuration from file, preset and flags
    pub fn build_config(&self) -> Result<DedupConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("invalid config file: {}", path.display()))?
            }
            None if self.low_memory => DedupConfig::low_memory(),
            None => DedupConfig::default(),
        };

        if self.config.is_some() && self.low_memory {
            let preset = DedupConfig::low_memory();
            config.batch_memory_ceiling = preset.batch_memory_ceiling;
            config.batch_floor = preset.batch_floor;
            config.purge_interval = preset.purge_interval;
            config.writer_flush_threshold = preset.writer_flush_threshold;
            config.output_blob_cap = preset.output_blob_cap;
            config.read_chunk_size = preset.read_chunk_size;
        }

        if let Some(mode) = self.match_mode {
            config.match_config.match_mode = mode.into();
        }
        if self.case_sensitive {
            config.match_config.case_sensitive = true;
        }
        if self.ignore_whitespace {
            config.match_config.ignore_whitespace = true;
        }
        if self.ignore_punctuation {
            config.match_config.ignore_punctuation = true;
        }
        if !self.prefer_creation_id.is_empty() {
            config.priority_config.creation_ids = self.prefer_creation_id.clone();
        }
        if !self.prefer_change_id.is_empty() {
            config.priority_config.change_ids = self.prefer_change_id.clone();
        }
        if self.date_first {
            config.priority_config.date_first = true;
        }
        if let Some(lang) = &self.source_lang {
            config.source_lang = Some(lang.clone());
        }
        if let Some(lang) = &self.target_lang {
            config.target_lang = Some(lang.clone());
        }
        if let Some(kb) = self.chunk_kb {
            config.read_chunk_size = kb * 1024;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bare_args() -> RuleArgs {
        RuleArgs {
            config: None,
            match_mode: None,
            case_sensitive: false,
            ignore_whitespace: false,
            ignore_punctuation: false,
            prefer_creation_id: Vec::new(),
            prefer_change_id: Vec::new(),
            date_first: false,
            source_lang: None,
            target_lang: None,
            low_memory: false,
            chunk_kb: None,
        }
    }

    #[test]
    fn defaults_without_flags() {
        let config = bare_args().build_config().unwrap();
        assert_eq!(config.match_config.match_mode, MatchMode::BothEqual);
        assert!(config.priority_config.creation_ids.is_empty());
    }

    #[test]
    fn flags_override_defaults() {
        let args = RuleArgs {
            match_mode: Some(MatchModeArg::SourceEqual),
            case_sensitive: true,
            prefer_creation_id: vec!["tm_admin".into()],
            source_lang: Some("en-US".into()),
            chunk_kb: Some(16),
            ..bare_args()
        };
        let config = args.build_config().unwrap();
        assert_eq!(config.match_config.match_mode, MatchMode::SourceEqual);
        assert!(config.match_config.case_sensitive);
        assert_eq!(config.priority_config.creation_ids, vec!["tm_admin"]);
        assert_eq!(config.source_lang.as_deref(), Some("en-US"));
        assert_eq!(config.read_chunk_size, 16 * 1024);
    }

    #[test]
    fn file_values_load_and_flags_win() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "source_lang = \"de-DE\"\n\n[match_config]\nmatch_mode = \"target_equal\""
        )
        .unwrap();

        let args = RuleArgs {
            config: Some(file.path().to_path_buf()),
            match_mode: Some(MatchModeArg::BothEqual),
            ..bare_args()
        };
        let config = args.build_config().unwrap();
        assert_eq!(config.source_lang.as_deref(), Some("de-DE"));
        assert_eq!(config.match_config.match_mode, MatchMode::BothEqual);
    }

    #[test]
    fn low_memory_preset_applies() {
        let args = RuleArgs {
            low_memory: true,
            ..bare_args()
        };
        let config = args.build_config().unwrap();
        assert_eq!(config.read_chunk_size, DedupConfig::low_memory().read_chunk_size);
    }
}
