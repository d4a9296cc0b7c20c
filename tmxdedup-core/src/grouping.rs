//! Memory-aware duplicate grouping
//!
//! Aggregates units into key groups in bounded batches. The batch member
//! target retunes itself after every flush so successive batches land near
//! the memory ceiling regardless of average record size. All tuning state is
//! owned by the engine and reset per invocation; there are no globals.

use std::collections::HashMap;

use crate::config::{DedupConfig, MatchConfig};
use crate::key::equivalence_key;
use crate::model::TranslationUnit;

/// Pluggable memory cost model for pending batches
///
/// The built-in model is a heuristic, not exact byte accounting; callers
/// that need real accounting can substitute their own.
pub trait MemoryEstimate {
    /// Estimated bytes held alive by one unit
    fn estimate(&self, unit: &TranslationUnit) -> usize;
}

/// Two bytes per character of every attribute and segment string
#[derive(Debug, Clone, Copy, Default)]
pub struct CharWidthEstimate;

impl MemoryEstimate for CharWidthEstimate {
    fn estimate(&self, unit: &TranslationUnit) -> usize {
        let mut chars = 0;
        for v in unit.variants() {
            chars += v.lang.chars().count() + v.text.chars().count();
        }
        let attrs = &unit.attrs;
        chars += attrs.creation_id.chars().count()
            + attrs.change_id.chars().count()
            + attrs.creation_date.chars().count()
            + attrs.change_date.chars().count();
        chars * 2
    }
}

/// Result of one grouping pass
#[derive(Debug, Default)]
pub struct GroupingOutput {
    /// Key → members in file order; every group has at least 2 members
    pub groups: HashMap<String, Vec<TranslationUnit>>,
    /// Units excluded because their key could not be derived
    pub unkeyed: u64,
}

/// Batching duplicate-grouping engine
pub struct GroupingEngine {
    match_config: MatchConfig,
    source_lang: String,
    target_lang: Option<String>,
    ceiling: usize,
    floor: usize,
    purge_interval: u32,
    estimator: Box<dyn MemoryEstimate + Send>,
    groups: HashMap<String, Vec<TranslationUnit>>,
    batch: Vec<(String, TranslationUnit)>,
    batch_estimate: usize,
    batch_target: usize,
    flushes: u32,
    unkeyed: u64,
}

impl GroupingEngine {
    /// Create an engine for one grouping pass
    pub fn new(config: &DedupConfig, source_lang: &str) -> Self {
        Self {
            match_config: config.match_config.clone(),
            source_lang: source_lang.to_string(),
            target_lang: config.target_lang.clone(),
            ceiling: config.batch_memory_ceiling,
            floor: config.batch_floor,
            purge_interval: config.purge_interval,
            estimator: Box::new(CharWidthEstimate),
            groups: HashMap::new(),
            batch: Vec::new(),
            batch_estimate: 0,
            // First flush is driven by the memory estimate alone
            batch_target: usize::MAX,
            flushes: 0,
            unkeyed: 0,
        }
    }

    /// Substitute the memory cost model
    pub fn with_estimator(mut self, estimator: Box<dyn MemoryEstimate + Send>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Add one unit, flushing the pending batch when it would outgrow
    /// the memory ceiling or the current batch target
    pub fn push(&mut self, unit: TranslationUnit) {
        let key = match equivalence_key(
            &unit,
            &self.match_config,
            &self.source_lang,
            self.target_lang.as_deref(),
        ) {
            Ok(key) => key,
            Err(_) => {
                // Excluded from grouping, still part of the file
                self.unkeyed += 1;
                return;
            }
        };

        let estimate = self.estimator.estimate(&unit);
        if !self.batch.is_empty()
            && (self.batch.len() >= self.batch_target
                || self.batch_estimate + estimate > self.ceiling)
        {
            self.flush();
        }

        self.batch.push((key, unit));
        self.batch_estimate += estimate;
    }

    /// Move the pending batch into the group mapping and retune the target
    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let count = self.batch.len();
        let estimate = self.batch_estimate.max(1);
        // Self-tuning control loop: scale the member target so the next
        // batch's estimate lands near the ceiling
        self.batch_target = count
            .saturating_mul(self.ceiling)
            .checked_div(estimate)
            .unwrap_or(self.floor)
            .max(self.floor);

        for (key, unit) in self.batch.drain(..) {
            self.groups.entry(key).or_default().push(unit);
        }
        self.batch_estimate = 0;
        self.flushes += 1;

        if self.flushes % self.purge_interval == 0 {
            // Bound mapping growth on files with few true duplicates
            self.groups.retain(|_, members| members.len() >= 2);
        }
    }

    /// Flush the remainder and return every group with at least 2 members
    pub fn finish(mut self) -> GroupingOutput {
        self.flush();
        self.groups.retain(|_, members| members.len() >= 2);
        GroupingOutput {
            groups: self.groups,
            unkeyed: self.unkeyed,
        }
    }
}

impl std::fmt::Debug for GroupingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupingEngine")
            .field("groups", &self.groups.len())
            .field("batch", &self.batch.len())
            .field("batch_target", &self.batch_target)
            .field("flushes", &self.flushes)
            .finish()
    }
}
