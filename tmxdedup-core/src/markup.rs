//! Low-level markup scanning and escaping helpers
//!
//! Shared by the incremental scanner and the streaming writer. This is a
//! positional tag scan, not an XML parser: it understands tag-name
//! boundaries, attribute quoting and comments, and nothing more. Literal
//! boundary markers inside segment text are indistinguishable from real
//! boundaries; callers escape reserved characters to prevent that.

/// Outcome of searching a buffer region for a tag
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TagSearch {
    /// Tag found at `start`, token ends (exclusive) at `end`
    Found {
        /// Byte index of the `<`
        start: usize,
        /// Byte index just past the `>`
        end: usize,
    },
    /// No such tag in the region
    NotFound,
    /// Scan stopped inside an incomplete construct starting at `at`;
    /// the caller must retain the buffer from there and feed more input
    Incomplete {
        /// Byte index of the unfinished `<`
        at: usize,
    },
}

/// Find the end of a tag token, honoring quoted attribute values
fn tag_token_end(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut in_quote: Option<u8> = None;
    for (idx, &b) in bytes.iter().enumerate().skip(start) {
        match in_quote {
            Some(q) => {
                if b == q {
                    in_quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => in_quote = Some(b),
                b'>' => return Some(idx + 1),
                _ => {}
            },
        }
    }
    None
}

/// Find the next opening tag `<name …>` at or after `from`
///
/// Skips comments and unrelated tags. A `<name` match requires a name
/// boundary (whitespace, `>` or `/`) so `<tu` never matches `<tuv`.
pub(crate) fn find_open(s: &str, from: usize, name: &str) -> TagSearch {
    let mut pos = from;
    while let Some(rel) = s[pos..].find('<') {
        let i = pos + rel;
        let rest = &s[i..];

        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(e) => {
                    pos = i + e + 3;
                    continue;
                }
                None => return TagSearch::Incomplete { at: i },
            }
        }
        // A '<' this close to the end cannot be classified yet
        if rest.len() < 4 && "<!--".starts_with(rest) {
            return TagSearch::Incomplete { at: i };
        }

        if rest[1..].starts_with(name) {
            let after = i + 1 + name.len();
            match s.as_bytes().get(after) {
                Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
                    return match tag_token_end(s, i) {
                        Some(end) => TagSearch::Found { start: i, end },
                        None => TagSearch::Incomplete { at: i },
                    };
                }
                Some(_) => {}
                None => return TagSearch::Incomplete { at: i },
            }
        } else if s.len() - i <= name.len() {
            // Possibly a truncated `<name` at the buffer edge
            if name.starts_with(&rest[1..]) {
                return TagSearch::Incomplete { at: i };
            }
        }

        // Unrelated tag: hop over its whole token
        match tag_token_end(s, i) {
            Some(end) => pos = end,
            None => return TagSearch::Incomplete { at: i },
        }
    }
    TagSearch::NotFound
}

/// Find the next closing tag `</name>` at or after `from`
///
/// The name boundary check keeps `</tu` from matching inside `</tuv>`.
pub(crate) fn find_close(s: &str, from: usize, name: &str) -> TagSearch {
    let bytes = s.as_bytes();
    let mut pos = from;
    while let Some(rel) = s[pos..].find("</") {
        let i = pos + rel;
        let rest = &s[i + 2..];
        if rest.len() < name.len() {
            if name.starts_with(rest) {
                return TagSearch::Incomplete { at: i };
            }
            return TagSearch::NotFound;
        }
        if rest.starts_with(name) {
            let mut j = i + 2 + name.len();
            while j < s.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match bytes.get(j) {
                Some(b'>') => return TagSearch::Found { start: i, end: j + 1 },
                Some(_) => {}
                None => return TagSearch::Incomplete { at: i },
            }
        }
        pos = i + 2;
    }
    TagSearch::NotFound
}

/// Parse `name="value"` pairs from the inside of an opening tag
///
/// `tag_body` is the token text between the tag name and the closing `>`.
/// Parsing stops quietly at the first malformed pair; skip-and-count
/// callers decide what a missing attribute means.
pub(crate) fn parse_attributes(tag_body: &str) -> Vec<(String, String)> {
    let bytes = tag_body.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'/' {
            break;
        }

        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name = &tag_body[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            break;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            break;
        }
        let quote = bytes[i];
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        attrs.push((name.to_string(), unescape(&tag_body[value_start..i])));
        i += 1;
    }

    attrs
}

/// Replace the five reserved characters with entity references
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Resolve the five reserved entity references; unknown entities pass through
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let replaced = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&apos;", '\''),
            ("&quot;", '"'),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match replaced {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
