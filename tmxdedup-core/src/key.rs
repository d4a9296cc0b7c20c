//! Equivalence key derivation
//!
//! Two units with equal keys under the same `MatchConfig` are duplicate
//! candidates. Key derivation is a pure function of the unit's text and the
//! config; processing order never influences it.

use crate::config::{MatchConfig, MatchMode};
use crate::error::{Error, Result};
use crate::model::{TranslationUnit, Variant};

/// Punctuation stripped when `ignore_punctuation` is set
const STRIPPED_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Derive the grouping key for one unit
///
/// `target_lang` of `None` selects the unit's non-source variant. Fails when
/// a variant required by the active match mode cannot be found.
pub fn equivalence_key(
    unit: &TranslationUnit,
    config: &MatchConfig,
    source_lang: &str,
    target_lang: Option<&str>,
) -> Result<String> {
    let source = || -> Result<&Variant> {
        unit.variant_for(source_lang).ok_or_else(|| Error::VariantNotFound {
            lang: source_lang.to_string(),
        })
    };
    let target = || -> Result<&Variant> {
        match target_lang {
            Some(token) => unit.variant_for(token).ok_or_else(|| Error::VariantNotFound {
                lang: token.to_string(),
            }),
            None => unit
                .variant_not_for(source_lang)
                .ok_or_else(|| Error::VariantNotFound {
                    lang: format!("non-{source_lang}"),
                }),
        }
    };

    match config.match_mode {
        MatchMode::SourceEqual => Ok(normalize(&source()?.text, config)),
        MatchMode::TargetEqual => Ok(normalize(&target()?.text, config)),
        MatchMode::BothEqual => Ok(format!(
            "{}|{}",
            normalize(&source()?.text, config),
            normalize(&target()?.text, config)
        )),
    }
}

/// Apply the configured normalization steps in their fixed order:
/// case folding, whitespace collapsing, punctuation stripping
fn normalize(text: &str, config: &MatchConfig) -> String {
    let mut s = if config.case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    };

    if config.ignore_whitespace {
        s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    if config.ignore_punctuation {
        s.retain(|ch| !STRIPPED_PUNCTUATION.contains(&ch));
    }

    s
}
