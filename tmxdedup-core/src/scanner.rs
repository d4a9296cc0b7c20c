//! Incremental scanner for translation-memory markup
//!
//! Consumes appended text chunks and produces the header once, then complete
//! translation units as their spans close. Only the unparsed suffix of the
//! input is ever buffered, so arbitrarily large files stay within a bounded
//! footprint.

use crate::error::{Error, Result};
use crate::markup::{find_close, find_open, parse_attributes, unescape, TagSearch};
use crate::model::{Header, HeaderProperty, InvalidUnit, TranslationUnit, UnitAttrs, Variant};

/// What `Scanner::finalize` hands back
#[derive(Debug)]
pub struct ScanOutput {
    /// The file header
    pub header: Header,
    /// The root element's `version` attribute, when it declared one
    pub version: Option<String>,
    /// Units completed by the final drain pass
    pub units: Vec<TranslationUnit>,
    /// Unit spans that were scanned but failed validation
    pub skipped: u64,
}

/// Streaming scanner over a growing text buffer
///
/// `feed` returns the units completed by each chunk so the caller can hand
/// them onward immediately instead of accumulating the whole file.
#[derive(Debug, Default)]
pub struct Scanner {
    buffer: String,
    header: Option<Header>,
    version: Option<String>,
    skipped: u64,
    produced: u64,
}

impl Scanner {
    /// Create a scanner with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// The header, once its closing marker has been consumed
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// The root element's declared version, once the header has parsed
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Rejected span count so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Append a chunk and drain every unit span it completed
    ///
    /// Until the header's closing marker arrives nothing is emitted; the
    /// chunk is buffered and the scan resumes on the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<TranslationUnit> {
        self.buffer.push_str(chunk);
        if self.header.is_none() && !self.try_parse_header() {
            return Vec::new();
        }
        self.drain_units()
    }

    /// Run one last drain pass and close the scan
    ///
    /// Fails if no header was ever parsed or no unit was ever produced; an
    /// empty-but-valid file is not supported.
    pub fn finalize(mut self) -> Result<ScanOutput> {
        let units = if self.header.is_some() {
            self.drain_units()
        } else {
            Vec::new()
        };
        let header = self.header.take().ok_or(Error::MissingHeader)?;
        if self.produced == 0 {
            return Err(Error::NoUnitsParsed {
                skipped: self.skipped,
            });
        }
        Ok(ScanOutput {
            header,
            version: self.version.take(),
            units,
            skipped: self.skipped,
        })
    }

    /// Parse the header once both its markers are buffered
    ///
    /// Consumes the buffer prefix through `</header>` on success.
    fn try_parse_header(&mut self) -> bool {
        let (start, open_end) = match find_open(&self.buffer, 0, "header") {
            TagSearch::Found { start, end } => (start, end),
            _ => return false,
        };

        // The root element precedes the header; grab its declared version
        // before the prefix is drained
        if let TagSearch::Found { start: t, end: te } = find_open(&self.buffer, 0, "tmx") {
            if t < start {
                let token = &self.buffer[t..te];
                let body_end = token.len() - if token.ends_with("/>") { 2 } else { 1 };
                self.version = parse_attributes(&token[4..body_end])
                    .into_iter()
                    .find(|(n, _)| n == "version")
                    .map(|(_, v)| v);
            }
        }

        let token = &self.buffer[start..open_end];
        if token.ends_with("/>") {
            // Attribute-only header with no properties
            let attributes = parse_attributes(&token[7..token.len() - 2]);
            self.header = Some(Header {
                attributes,
                properties: Vec::new(),
            });
            self.buffer.drain(..open_end);
            return true;
        }

        let (close_start, close_end) = match find_close(&self.buffer, open_end, "header") {
            TagSearch::Found { start, end } => (start, end),
            _ => return false,
        };

        let attributes = parse_attributes(&token[7..token.len() - 1]);
        let properties = parse_properties(&self.buffer[open_end..close_start]);
        self.header = Some(Header {
            attributes,
            properties,
        });
        self.buffer.drain(..close_end);
        true
    }

    /// Drain complete `<tu>` spans, retaining only the unparsed suffix
    fn drain_units(&mut self) -> Vec<TranslationUnit> {
        let mut out = Vec::new();
        let mut consumed = 0usize;

        loop {
            let (start, open_end) = match find_open(&self.buffer, consumed, "tu") {
                TagSearch::Found { start, end } => (start, end),
                TagSearch::NotFound => {
                    consumed = self.buffer.len();
                    break;
                }
                TagSearch::Incomplete { at } => {
                    consumed = at;
                    break;
                }
            };

            if self.buffer[start..open_end].ends_with("/>") {
                // A unit with no variants can never satisfy the invariant
                self.skipped += 1;
                consumed = open_end;
                continue;
            }

            let (close_start, close_end) = match find_close(&self.buffer, open_end, "tu") {
                TagSearch::Found { start, end } => (start, end),
                // Partial unit at the buffer edge: keep it for the next feed
                _ => {
                    consumed = start;
                    break;
                }
            };

            let attr_body = &self.buffer[start + 3..open_end - 1];
            let content = &self.buffer[open_end..close_start];
            match parse_unit(attr_body, content) {
                Ok(unit) => {
                    self.produced += 1;
                    out.push(unit);
                }
                Err(_) => self.skipped += 1,
            }
            consumed = close_end;
        }

        self.buffer.drain(..consumed);
        out
    }
}

/// Parse `<prop type="…">text</prop>` children of the header
fn parse_properties(content: &str) -> Vec<HeaderProperty> {
    let mut properties = Vec::new();
    let mut pos = 0;

    while let TagSearch::Found { start, end } = find_open(content, pos, "prop") {
        let (close_start, close_end) = match find_close(content, end, "prop") {
            TagSearch::Found { start, end } => (start, end),
            _ => break,
        };
        let attrs = parse_attributes(&content[start + 5..end - 1]);
        let prop_type = attrs
            .into_iter()
            .find(|(n, _)| n == "type")
            .map(|(_, v)| v)
            .unwrap_or_default();
        properties.push(HeaderProperty {
            prop_type,
            text: unescape(&content[end..close_start]),
        });
        pos = close_end;
    }

    properties
}

/// Materialize one unit span into a validated record
fn parse_unit(attr_body: &str, content: &str) -> std::result::Result<TranslationUnit, InvalidUnit> {
    let attrs = parse_attributes(attr_body);
    let attr = |name: &str| {
        attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    let unit_attrs = UnitAttrs {
        creation_id: attr("creationid"),
        change_id: attr("changeid"),
        creation_date: attr("creationdate"),
        change_date: attr("changedate"),
    };

    let mut variants = Vec::new();
    let mut pos = 0;
    while let TagSearch::Found { start, end } = find_open(content, pos, "tuv") {
        let (close_start, close_end) = match find_close(content, end, "tuv") {
            TagSearch::Found { start, end } => (start, end),
            _ => return Err(InvalidUnit::Malformed),
        };
        let tuv_attrs = parse_attributes(&content[start + 4..end - 1]);
        let lang = tuv_attrs
            .iter()
            .find(|(n, _)| n == "xml:lang")
            .or_else(|| tuv_attrs.iter().find(|(n, _)| n == "lang"))
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        variants.push(Variant {
            lang,
            text: seg_text(&content[end..close_start]),
        });
        pos = close_end;
    }

    TranslationUnit::new(variants, unit_attrs)
}

/// Extract and unescape the `<seg>` text of one variant
fn seg_text(tuv_content: &str) -> String {
    let (_, open_end) = match find_open(tuv_content, 0, "seg") {
        TagSearch::Found { start, end } => (start, end),
        _ => return String::new(),
    };
    match find_close(tuv_content, open_end, "seg") {
        TagSearch::Found { start, .. } => unescape(&tuv_content[open_end..start]),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = concat!(
        r#"<tmx version="1.4"><header creationtool="maker" srclang="en-US" "#,
        r#"datatype="plaintext"><prop type="domain">legal</prop></header><body>"#
    );

    fn unit(src: &str, tgt: &str, attrs: &str) -> String {
        format!(
            r#"<tu{attrs}><tuv xml:lang="en-US"><seg>{src}</seg></tuv><tuv xml:lang="fr-FR"><seg>{tgt}</seg></tuv></tu>"#
        )
    }

    #[test]
    fn header_then_units_in_one_chunk() {
        let mut scanner = Scanner::new();
        let text = format!("{HEADER}{}{}", unit("Hello", "Bonjour", ""), unit("Bye", "Au revoir", ""));
        let units = scanner.feed(&text);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].variants()[0].text, "Hello");

        let header = scanner.header().unwrap();
        assert_eq!(header.source_lang(), Some("en-US"));
        assert_eq!(header.properties.len(), 1);
        assert_eq!(header.properties[0].prop_type, "domain");
        assert_eq!(header.properties[0].text, "legal");
    }

    #[test]
    fn unit_split_across_chunks_parses_once() {
        let mut scanner = Scanner::new();
        let text = unit("Hello", "Bonjour", "");
        let (first, second) = text.split_at(text.len() / 2);

        let mut total = scanner.feed(HEADER).len();
        total += scanner.feed(first).len();
        total += scanner.feed(second).len();
        assert_eq!(total, 1);

        let output = scanner.finalize().unwrap();
        assert_eq!(output.units.len(), 0);
        assert_eq!(output.skipped, 0);
    }

    #[test]
    fn split_at_every_boundary_yields_one_unit() {
        let text = format!("{HEADER}{}", unit("a & b", "c < d", r#" creationid="x""#));
        for cut in 1..text.len() {
            if !text.is_char_boundary(cut) {
                continue;
            }
            let mut scanner = Scanner::new();
            let mut units = scanner.feed(&text[..cut]);
            units.extend(scanner.feed(&text[cut..]));
            assert_eq!(units.len(), 1, "cut at {cut}");
            assert_eq!(units[0].variants()[0].text, "a & b");
            assert_eq!(units[0].variants()[1].text, "c < d");
            assert_eq!(units[0].attrs.creation_id, "x");
        }
    }

    #[test]
    fn invalid_span_is_counted_not_fatal() {
        let mut scanner = Scanner::new();
        let bad = r#"<tu><tuv xml:lang="en"><seg>only one side</seg></tuv></tu>"#;
        let text = format!("{HEADER}{bad}{}", unit("Hello", "Bonjour", ""));
        let units = scanner.feed(&text);
        assert_eq!(units.len(), 1);
        assert_eq!(scanner.skipped(), 1);
    }

    #[test]
    fn empty_segment_is_counted() {
        let mut scanner = Scanner::new();
        let text = format!("{HEADER}{}", unit("", "Bonjour", ""));
        assert!(scanner.feed(&text).is_empty());
        assert_eq!(scanner.skipped(), 1);
    }

    #[test]
    fn commented_out_unit_is_not_parsed() {
        let mut scanner = Scanner::new();
        let text = format!(
            "{HEADER}<!-- {} -->{}",
            unit("ghost", "fantôme", ""),
            unit("Hello", "Bonjour", "")
        );
        let units = scanner.feed(&text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].variants()[0].text, "Hello");
        assert_eq!(scanner.skipped(), 0);
    }

    #[test]
    fn provenance_attributes_are_captured() {
        let mut scanner = Scanner::new();
        let attrs = r#" creationid="alice" changeid="bob" creationdate="20240101T000000Z" changedate="20240201T000000Z""#;
        let text = format!("{HEADER}{}", unit("Hello", "Bonjour", attrs));
        let units = scanner.feed(&text);
        assert_eq!(units[0].attrs.creation_id, "alice");
        assert_eq!(units[0].attrs.change_id, "bob");
        assert_eq!(units[0].attrs.creation_date, "20240101T000000Z");
        assert_eq!(units[0].attrs.change_date, "20240201T000000Z");
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let mut scanner = Scanner::new();
        let text = format!("{HEADER}{}", unit("a &lt;b&gt; &amp; c", "d &quot;e&quot;", ""));
        let units = scanner.feed(&text);
        assert_eq!(units[0].variants()[0].text, "a <b> & c");
        assert_eq!(units[0].variants()[1].text, "d \"e\"");
    }

    #[test]
    fn finalize_without_header_is_fatal() {
        let mut scanner = Scanner::new();
        scanner.feed("just some text, no markup at all");
        assert!(matches!(scanner.finalize(), Err(Error::MissingHeader)));
    }

    #[test]
    fn finalize_without_units_is_fatal() {
        let mut scanner = Scanner::new();
        scanner.feed(HEADER);
        scanner.feed("</body></tmx>");
        assert!(matches!(
            scanner.finalize(),
            Err(Error::NoUnitsParsed { skipped: 0 })
        ));
    }

    #[test]
    fn root_version_is_captured() {
        let mut scanner = Scanner::new();
        let text = format!(
            r#"<tmx version="1.5"><header srclang="en"/><body>{}"#,
            unit("Hello", "Bonjour", "")
        );
        scanner.feed(&text);
        assert_eq!(scanner.version(), Some("1.5"));
        let output = scanner.finalize().unwrap();
        assert_eq!(output.version.as_deref(), Some("1.5"));
    }

    #[test]
    fn missing_root_version_is_none() {
        let mut scanner = Scanner::new();
        let text = format!(
            r#"<tmx><header srclang="en"/><body>{}"#,
            unit("Hello", "Bonjour", "")
        );
        scanner.feed(&text);
        assert_eq!(scanner.finalize().unwrap().version, None);
    }

    #[test]
    fn self_closing_header_parses() {
        let mut scanner = Scanner::new();
        let text = format!(
            r#"<tmx version="1.4"><header srclang="en"/><body>{}"#,
            unit("Hello", "Bonjour", "")
        );
        let units = scanner.feed(&text);
        assert_eq!(units.len(), 1);
        assert_eq!(scanner.header().unwrap().source_lang(), Some("en"));
    }

    #[test]
    fn buffer_does_not_retain_consumed_units() {
        let mut scanner = Scanner::new();
        scanner.feed(HEADER);
        for _ in 0..100 {
            scanner.feed(&unit("Hello", "Bonjour", ""));
        }
        // Everything parsed; only trailing emptiness may remain
        assert!(scanner.buffer.len() < 16);
    }
}
