//! Pipeline orchestration
//!
//! Wires the scanner, grouping engine, resolver, writer and assembler into
//! one strictly sequential pipeline driven by an external chunk source and
//! codec. Analysis and rewrite are two streaming passes over the source, so
//! nothing larger than the configured ceilings is ever held in memory.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::assembler::OutputAssembler;
use crate::config::DedupConfig;
use crate::error::{Error, Result};
use crate::grouping::{GroupingEngine, GroupingOutput};
use crate::model::{Header, TranslationUnit, UnitStatus, UnitVerdict};
use crate::resolve::resolve;
use crate::scanner::Scanner;
use crate::writer::StreamingWriter;

/// Opaque name of a detected character encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTag(pub String);

impl EncodingTag {
    /// The encoding's label
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Random-access byte source with a known total length
///
/// The pipeline reads sequentially ascending offsets, restarting from zero
/// for the rewrite pass.
pub trait ChunkSource {
    /// Total length in bytes
    fn len(&self) -> u64;

    /// Whether the source is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `len` bytes starting at `offset`
    fn read(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;
}

impl ChunkSource for Cursor<Vec<u8>> {
    fn len(&self) -> u64 {
        self.get_ref().len() as u64
    }

    fn read(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let data = self.get_ref();
        let start = (offset as usize).min(data.len());
        let end = (start + len).min(data.len());
        Ok(data[start..end].to_vec())
    }
}

/// Black-box character codec
///
/// Detection runs once on a leading sample; the encoding is assumed constant
/// for the whole file.
pub trait Codec {
    /// Guess the encoding from a leading sample
    fn detect(&self, sample: &[u8]) -> EncodingTag;

    /// Decode one chunk of bytes to text
    fn decode(&self, bytes: &[u8], tag: &EncodingTag) -> Result<String>;

    /// Encode text back to bytes
    fn encode(&self, text: &str, tag: &EncodingTag) -> Result<Vec<u8>>;

    /// Length of a trailing byte sequence the chunk does not finish
    ///
    /// The pipeline holds these bytes back and prepends them to the next
    /// chunk so multi-byte characters survive chunk boundaries.
    fn incomplete_suffix(&self, _bytes: &[u8], _tag: &EncodingTag) -> usize {
        0
    }
}

/// Codec for input that is already UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Codec for Utf8Codec {
    fn detect(&self, _sample: &[u8]) -> EncodingTag {
        EncodingTag("utf-8".into())
    }

    fn decode(&self, bytes: &[u8], _tag: &EncodingTag) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Decode(e.to_string()))
    }

    fn encode(&self, text: &str, _tag: &EncodingTag) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }

    fn incomplete_suffix(&self, bytes: &[u8], _tag: &EncodingTag) -> usize {
        utf8_incomplete_suffix(bytes)
    }
}

/// Bytes at the end of `bytes` that start a UTF-8 sequence it doesn't finish
pub fn utf8_incomplete_suffix(bytes: &[u8]) -> usize {
    // A sequence is at most 4 bytes; look back that far for a leading byte
    let tail = bytes.len().saturating_sub(4);
    for i in (tail..bytes.len()).rev() {
        let b = bytes[i];
        let needed = if b & 0b1000_0000 == 0 {
            1
        } else if b & 0b1110_0000 == 0b1100_0000 {
            2
        } else if b & 0b1111_0000 == 0b1110_0000 {
            3
        } else if b & 0b1111_1000 == 0b1111_0000 {
            4
        } else {
            continue; // continuation byte
        };
        if i + needed > bytes.len() {
            return bytes.len() - i;
        }
        return 0;
    }
    0
}

/// Cooperative cancellation signal
///
/// Checked between chunk reads and between group resolutions; cancellation
/// aborts the pipeline and no output is produced.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a full deduplication run
#[derive(Debug)]
pub struct DedupReport {
    /// Units written to the output
    pub kept: u64,
    /// Duplicate units removed
    pub deleted: u64,
    /// Spans rejected by the scanner
    pub skipped: u64,
    /// Units excluded from grouping because no key could be derived
    pub unkeyed: u64,
    /// Duplicate groups that required resolution
    pub groups: u64,
    /// Detected encoding label
    pub encoding: String,
    /// Encoded output blobs in byte order
    pub blobs: Vec<Vec<u8>>,
}

/// Result of an analysis-only run
#[derive(Debug)]
pub struct AnalysisReport {
    /// One entry per duplicate-group member, groups in key order
    pub verdicts: Vec<UnitVerdict>,
    /// Duplicate groups found
    pub groups: u64,
    /// Spans rejected by the scanner
    pub skipped: u64,
    /// Units excluded from grouping
    pub unkeyed: u64,
    /// Detected encoding label
    pub encoding: String,
}

struct Analysis {
    header: Header,
    version: Option<String>,
    tag: EncodingTag,
    source_lang: String,
    grouping: GroupingOutput,
    skipped: u64,
}

/// The deduplication pipeline
pub struct DedupPipeline {
    config: DedupConfig,
    cancel: CancelToken,
}

impl DedupPipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Attach an externally held cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Analysis only: scan, group and resolve, producing verdicts
    pub fn analyze<S: ChunkSource, C: Codec>(
        &self,
        source: &mut S,
        codec: &C,
    ) -> Result<AnalysisReport> {
        let analysis = self.scan_and_group(source, codec)?;
        let group_count = analysis.grouping.groups.len() as u64;

        let mut keys: Vec<String> = analysis.grouping.groups.keys().cloned().collect();
        keys.sort();

        let mut verdicts = Vec::new();
        let mut groups = analysis.grouping.groups;
        for key in keys {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let members = groups.remove(&key).unwrap_or_default();
            for resolved in resolve(members, &self.config.priority_config) {
                verdicts.push(verdict(&resolved.unit, resolved.status, &analysis.source_lang));
            }
        }

        Ok(AnalysisReport {
            verdicts,
            groups: group_count,
            skipped: analysis.skipped,
            unkeyed: analysis.grouping.unkeyed,
            encoding: analysis.tag.0,
        })
    }

    /// Full run: analyze, then rewrite the file without the deleted units
    pub fn run<S: ChunkSource, C: Codec>(
        &self,
        source: &mut S,
        codec: &C,
    ) -> Result<DedupReport> {
        let analysis = self.scan_and_group(source, codec)?;
        let group_count = analysis.grouping.groups.len() as u64;
        let unkeyed = analysis.grouping.unkeyed;

        // Fingerprint counts of the members to drop; counts handle groups
        // whose members are byte-identical
        let mut delete_counts: HashMap<String, u32> = HashMap::new();
        for (_, members) in analysis.grouping.groups.iter() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for resolved in resolve(members.clone(), &self.config.priority_config) {
                if resolved.status == UnitStatus::Delete {
                    *delete_counts.entry(resolved.unit.fingerprint()).or_insert(0) += 1;
                }
            }
        }

        // Rewrite pass: stream the file again, dropping delete-marked units
        let mut writer = StreamingWriter::new(self.config.writer_flush_threshold)
            .with_version(analysis.version.clone());
        writer.open(&analysis.header)?;
        let mut kept = 0u64;
        let mut deleted = 0u64;

        self.stream_units(source, codec, &analysis.tag, |_, unit| {
            match delete_counts.get_mut(&unit.fingerprint()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    deleted += 1;
                    Ok(())
                }
                _ => {
                    kept += 1;
                    writer.write_unit(&unit)
                }
            }
        })?;

        let chunks = writer.close()?;
        let assembler = OutputAssembler::new(self.config.output_blob_cap);
        let mut blobs = Vec::new();
        for blob in assembler.assemble(chunks) {
            blobs.push(codec.encode(&blob, &analysis.tag)?);
        }

        Ok(DedupReport {
            kept,
            deleted,
            skipped: analysis.skipped,
            unkeyed,
            groups: group_count,
            encoding: analysis.tag.0,
            blobs,
        })
    }

    /// First pass: detect the encoding, scan every unit into the grouping
    /// engine, keep the header
    fn scan_and_group<S: ChunkSource, C: Codec>(
        &self,
        source: &mut S,
        codec: &C,
    ) -> Result<Analysis> {
        let total = source.len();
        let sample_len = (self.config.detect_sample_size as u64).min(total) as usize;
        let sample = source.read(0, sample_len)?;
        let tag = codec.detect(&sample);

        let mut engine: Option<GroupingEngine> = None;
        let mut source_lang: Option<String> = None;
        let config = &self.config;

        let (header, version, skipped) = self.stream_units(source, codec, &tag, |header, unit| {
            let engine = match engine.as_mut() {
                Some(engine) => engine,
                None => {
                    // The header has always parsed by the time a unit
                    // completes, so srclang is available here
                    let lang = config
                        .source_lang
                        .clone()
                        .or_else(|| header.source_lang().map(str::to_string))
                        .ok_or_else(|| {
                            Error::InvalidConfig(
                                "no source language configured and header has no srclang".into(),
                            )
                        })?;
                    source_lang = Some(lang.clone());
                    engine.insert(GroupingEngine::new(config, &lang))
                }
            };
            engine.push(unit);
            Ok(())
        })?;

        let grouping = engine.map(GroupingEngine::finish).unwrap_or_default();

        let lang = source_lang.unwrap_or_else(|| {
            config
                .source_lang
                .clone()
                .or_else(|| header.source_lang().map(str::to_string))
                .unwrap_or_default()
        });

        Ok(Analysis {
            header,
            version,
            tag,
            source_lang: lang,
            grouping,
            skipped,
        })
    }

    /// Drive one streaming pass over the source, invoking `on_unit` for
    /// every valid unit in file order
    fn stream_units<S, C, F>(
        &self,
        source: &mut S,
        codec: &C,
        tag: &EncodingTag,
        mut on_unit: F,
    ) -> Result<(Header, Option<String>, u64)>
    where
        S: ChunkSource,
        C: Codec,
        F: FnMut(&Header, TranslationUnit) -> Result<()>,
    {
        let total = source.len();
        let mut scanner = Scanner::new();
        let mut offset = 0u64;
        let mut carry: Vec<u8> = Vec::new();

        while offset < total {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let want = (self.config.read_chunk_size as u64).min(total - offset) as usize;
            let chunk = source.read(offset, want)?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as u64;

            let mut bytes = std::mem::take(&mut carry);
            bytes.extend_from_slice(&chunk);
            if offset < total {
                // The whole buffer may be one unfinished sequence (tiny
                // chunk sizes); carrying everything leaves a harmless
                // empty decode
                let hold = codec.incomplete_suffix(&bytes, tag).min(bytes.len());
                if hold > 0 {
                    carry = bytes.split_off(bytes.len() - hold);
                }
            }

            let text = codec.decode(&bytes, tag)?;
            for unit in scanner.feed(&text) {
                match scanner.header() {
                    Some(header) => on_unit(header, unit)?,
                    None => return Err(Error::MissingHeader),
                }
            }
        }

        let output = scanner.finalize()?;
        for unit in output.units {
            on_unit(&output.header, unit)?;
        }
        Ok((output.header, output.version, output.skipped))
    }
}

fn verdict(unit: &TranslationUnit, status: UnitStatus, source_lang: &str) -> UnitVerdict {
    let (source_text, target_text) = match unit.variant_for(source_lang) {
        Some(src) => (
            src.text.clone(),
            unit.variant_not_for(source_lang)
                .map(|v| v.text.clone())
                .unwrap_or_default(),
        ),
        None => (
            unit.variants()[0].text.clone(),
            unit.variants()[1].text.clone(),
        ),
    };
    UnitVerdict {
        source_text,
        target_text,
        creation_id: unit.attrs.creation_id.clone(),
        change_id: unit.attrs.change_id.clone(),
        creation_date: unit.attrs.creation_date.clone(),
        change_date: unit.attrs.change_date.clone(),
        status,
    }
}
