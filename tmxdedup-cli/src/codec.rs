//! Character encoding detection and transcoding
//!
//! Wraps `chardetng` and `encoding_rs` behind the pipeline's codec seam so
//! legacy translation memories (windows-1252, shift_jis, UTF-16 exports
//! re-saved as legacy bytes) decode transparently.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tmxdedup_core::{Codec, EncodingTag, Error, Result};

/// Codec that sniffs the encoding once and transcodes chunk by chunk
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingCodec;

impl EncodingCodec {
    fn encoding_for(tag: &EncodingTag) -> Result<&'static Encoding> {
        Encoding::for_label(tag.name().as_bytes())
            .ok_or_else(|| Error::Decode(format!("unknown encoding label '{}'", tag.name())))
    }
}

impl Codec for EncodingCodec {
    fn detect(&self, sample: &[u8]) -> EncodingTag {
        // A UTF-8 BOM is authoritative; skip statistical detection
        if sample.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return EncodingTag(UTF_8.name().to_lowercase());
        }

        let mut detector = EncodingDetector::new();
        detector.feed(sample, false);
        let encoding = detector.guess(None, true);
        EncodingTag(encoding.name().to_lowercase())
    }

    fn decode(&self, bytes: &[u8], tag: &EncodingTag) -> Result<String> {
        let encoding = Self::encoding_for(tag)?;
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(Error::Decode(format!(
                "malformed {} byte sequence",
                tag.name()
            )));
        }
        Ok(text.into_owned())
    }

    fn encode(&self, text: &str, tag: &EncodingTag) -> Result<Vec<u8>> {
        let encoding = Self::encoding_for(tag)?;
        let (bytes, _, had_unmappable) = encoding.encode(text);
        if had_unmappable {
            return Err(Error::Encode(format!(
                "text contains characters unmappable in {}",
                tag.name()
            )));
        }
        Ok(bytes.into_owned())
    }

    fn incomplete_suffix(&self, bytes: &[u8], tag: &EncodingTag) -> usize {
        let Ok(encoding) = Self::encoding_for(tag) else {
            return 0;
        };
        if encoding == UTF_8 {
            return tmxdedup_core::pipeline::utf8_incomplete_suffix(bytes);
        }

        // Multi-byte legacy encodings: probe whether trimming up to three
        // trailing bytes turns a malformed tail into a clean decode
        let (_, had_errors) = encoding.decode_without_bom_handling(bytes);
        if !had_errors {
            return 0;
        }
        for hold in 1..=3usize {
            if hold > bytes.len() {
                break;
            }
            // Trimming the whole buffer means every byte belongs to the
            // unfinished sequence; an empty remainder decodes cleanly
            if hold == bytes.len() {
                return hold;
            }
            let (_, had_errors) =
                encoding.decode_without_bom_handling(&bytes[..bytes.len() - hold]);
            if !had_errors {
                return hold;
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> EncodingTag {
        EncodingTag(name.to_string())
    }

    #[test]
    fn bom_forces_utf8() {
        let codec = EncodingCodec;
        let mut sample = vec![0xEF, 0xBB, 0xBF];
        sample.extend_from_slice("<tmx>".as_bytes());
        assert_eq!(codec.detect(&sample).name(), "utf-8");
    }

    #[test]
    fn ascii_detects_and_round_trips() {
        let codec = EncodingCodec;
        let bytes = b"<tmx version=\"1.4\">";
        let detected = codec.detect(bytes);
        let text = codec.decode(bytes, &detected).unwrap();
        assert_eq!(text, "<tmx version=\"1.4\">");
        assert_eq!(codec.encode(&text, &detected).unwrap(), bytes);
    }

    #[test]
    fn windows_1252_decodes() {
        let codec = EncodingCodec;
        // 0xE9 is é in windows-1252
        let bytes = [b'd', 0xE9, b'j', 0xE0];
        assert_eq!(
            codec.decode(&bytes, &tag("windows-1252")).unwrap(),
            "déjà"
        );
    }

    #[test]
    fn unknown_label_is_an_error() {
        let codec = EncodingCodec;
        assert!(codec.decode(b"x", &tag("no-such-encoding")).is_err());
    }

    #[test]
    fn utf8_split_sequence_is_held_back() {
        let codec = EncodingCodec;
        let mut bytes = "caf".as_bytes().to_vec();
        bytes.push(0xC3); // first byte of é
        assert_eq!(codec.incomplete_suffix(&bytes, &tag("utf-8")), 1);
    }

    #[test]
    fn shift_jis_split_sequence_is_held_back() {
        let codec = EncodingCodec;
        // こ is 0x82 0xB1 in shift_jis; cut after the lead byte
        let bytes = [b'a', 0x82];
        assert_eq!(codec.incomplete_suffix(&bytes, &tag("shift_jis")), 1);
    }

    #[test]
    fn whole_buffer_incomplete_sequence_is_held_back() {
        let codec = EncodingCodec;
        // The buffer is nothing but the start of a multi-byte character
        assert_eq!(codec.incomplete_suffix(&[0xC3], &tag("utf-8")), 1);
        assert_eq!(codec.incomplete_suffix(&[0x82], &tag("shift_jis")), 1);
    }

    #[test]
    fn single_byte_encoding_never_holds_back() {
        let codec = EncodingCodec;
        let bytes = [b'a', 0xE9];
        assert_eq!(codec.incomplete_suffix(&bytes, &tag("windows-1252")), 0);
    }

    #[test]
    fn unmappable_characters_fail_encoding() {
        let codec = EncodingCodec;
        assert!(codec.encode("日本語", &tag("windows-1252")).is_err());
        assert!(codec.encode("日本語", &tag("shift_jis")).is_ok());
    }
}
