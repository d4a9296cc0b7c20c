//! Record types for the translation-memory file
//!
//! Header and units are produced once by the scanner from immutable input
//! text and never mutated afterwards.

use serde::Serialize;
use thiserror::Error;

/// A typed `<prop>` entry of the file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProperty {
    /// The property's `type` attribute
    pub prop_type: String,
    /// The property's text content
    pub text: String,
}

/// The file header: attributes plus ordered typed properties
///
/// Attributes are kept as an ordered list of pairs so re-serialization
/// preserves the order they appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// Attribute name/value pairs in file order
    pub attributes: Vec<(String, String)>,
    /// Typed properties in file order
    pub properties: Vec<HeaderProperty>,
}

impl Header {
    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The source language code declared by the header
    pub fn source_lang(&self) -> Option<&str> {
        self.attribute("srclang")
    }
}

/// One language's side of a translation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Language tag, e.g. `en-US`
    pub lang: String,
    /// Segment text, unescaped
    pub text: String,
}

impl Variant {
    /// Case-insensitive prefix match against a language token
    ///
    /// `lang_matches("en")` is true for `en`, `EN-us` and `en-GB`.
    pub fn lang_matches(&self, token: &str) -> bool {
        let lang = self.lang.as_bytes();
        let token = token.as_bytes();
        lang.len() >= token.len()
            && lang[..token.len()].eq_ignore_ascii_case(token)
    }
}

/// Provenance attributes of a translation unit
///
/// Every field defaults to the explicit empty marker `""`; an absent
/// attribute and an empty one are deliberately indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitAttrs {
    /// `creationid` attribute
    pub creation_id: String,
    /// `changeid` attribute
    pub change_id: String,
    /// `creationdate` attribute
    pub creation_date: String,
    /// `changedate` attribute
    pub change_date: String,
}

/// Why a scanned unit span failed validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidUnit {
    /// Not exactly two variants
    #[error("expected exactly 2 variants, found {0}")]
    VariantCount(usize),
    /// A variant carries no language tag
    #[error("variant has an empty language tag")]
    EmptyLanguage,
    /// A variant's segment text is empty
    #[error("variant has an empty segment")]
    EmptySegment,
    /// Both variants claim the same language
    #[error("both variants use language '{0}'")]
    SameLanguage(String),
    /// The span's markup could not be interpreted at all
    #[error("malformed unit span")]
    Malformed,
}

/// One source/target segment pair with provenance attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    variants: [Variant; 2],
    /// Provenance attributes
    pub attrs: UnitAttrs,
}

impl TranslationUnit {
    /// Validate and construct a unit
    ///
    /// Enforces the record invariant: exactly two variants, each with a
    /// non-empty language tag and non-empty segment text, and distinct
    /// language tags. A rejected span is counted by the caller, never fatal.
    pub fn new(variants: Vec<Variant>, attrs: UnitAttrs) -> Result<Self, InvalidUnit> {
        let [a, b]: [Variant; 2] = variants
            .try_into()
            .map_err(|v: Vec<Variant>| InvalidUnit::VariantCount(v.len()))?;

        for v in [&a, &b] {
            if v.lang.is_empty() {
                return Err(InvalidUnit::EmptyLanguage);
            }
            if v.text.is_empty() {
                return Err(InvalidUnit::EmptySegment);
            }
        }
        if a.lang.eq_ignore_ascii_case(&b.lang) {
            return Err(InvalidUnit::SameLanguage(a.lang));
        }

        Ok(Self {
            variants: [a, b],
            attrs,
        })
    }

    /// The two variants in file order
    pub fn variants(&self) -> &[Variant; 2] {
        &self.variants
    }

    /// The variant whose language prefix-matches `token`
    pub fn variant_for(&self, token: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.lang_matches(token))
    }

    /// The variant that does not prefix-match `token`
    pub fn variant_not_for(&self, token: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| !v.lang_matches(token))
    }

    /// Exact identity string over every field
    ///
    /// Used to match units between the analysis pass and the rewrite pass.
    /// Fields are joined with a control byte that cannot appear in parsed
    /// attribute or segment text.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for v in &self.variants {
            out.push_str(&v.lang);
            out.push('\u{1}');
            out.push_str(&v.text);
            out.push('\u{1}');
        }
        out.push_str(&self.attrs.creation_id);
        out.push('\u{1}');
        out.push_str(&self.attrs.change_id);
        out.push('\u{1}');
        out.push_str(&self.attrs.creation_date);
        out.push('\u{1}');
        out.push_str(&self.attrs.change_date);
        out
    }
}

/// Survivor marker produced by resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// The group's single survivor
    Keep,
    /// Removed from the output
    Delete,
}

/// A group member tagged with its resolution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    /// The group member
    pub unit: TranslationUnit,
    /// Keep or delete
    pub status: UnitStatus,
}

/// Flat analysis interchange record
///
/// The contract between the analysis stage and any consumer of its results:
/// one entry per duplicate-group member, serializable for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitVerdict {
    /// Source segment text
    pub source_text: String,
    /// Target segment text
    pub target_text: String,
    /// `creationid` attribute
    pub creation_id: String,
    /// `changeid` attribute
    pub change_id: String,
    /// `creationdate` attribute
    pub creation_date: String,
    /// `changedate` attribute
    pub change_date: String,
    /// Keep or delete
    pub status: UnitStatus,
}
