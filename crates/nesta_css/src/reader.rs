//! Input decoding.
//!
//! The encoding of a stylesheet is determined from, in order: a forced
//! source encoding, a byte-pattern table over the first 212 bytes (BOMs and
//! `@charset` rules in 8/16/32-bit big/little/mixed-endian layouts), and the
//! default encoding. When the sniff matched a `@charset` pattern, the parsed
//! tree must later carry a matching charset rule.
//!
//! The 32-bit layouts are detected by the table but have no codec in the
//! runtime, so they surface as unknown encodings.

use std::path::Path;

use encoding_rs::{Encoding, EncoderResult};
use nesta_shared::errors::{CssError, CssResult};

/// How far the byte-pattern table looks into the input
const SNIFF_LIMIT: usize = 212;

const DEFAULT_ENCODING: &str = "utf-8";

/// A decoded input with what was learned while decoding it
#[derive(Debug)]
pub struct ReadOutcome {
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when the sniff matched a `@charset` pattern; the parser output
    /// must then contain a matching charset rule
    pub charset_rule_required: bool,
    /// True when the encoding was forced by configuration
    pub forced_encoding: bool,
}

/// Resolves an encoding label, accepting underscore spellings
pub fn lookup_encoding(label: &str) -> CssResult<&'static Encoding> {
    let normalized = label.replace('_', "-");
    Encoding::for_label(normalized.as_bytes())
        .ok_or_else(|| CssError::EncodingNotFound(label.to_string()))
}

/// Reads one ascii character widened to `stride` bytes, with the meaningful
/// byte at `pos` within the group and zero bytes elsewhere
fn match_group(head: &[u8], i: usize, stride: usize, pos: usize) -> Option<u8> {
    let group = head.get(i..i + stride)?;
    for (k, b) in group.iter().enumerate() {
        if k != pos && *b != 0 {
            return None;
        }
    }
    Some(group[pos])
}

/// Matches `@charset "NAME";` with every character widened to `stride`
/// bytes, optionally preceded by a BOM. Returns the charset name.
fn widened_charset(head: &[u8], bom: &[u8], stride: usize, pos: usize) -> Option<String> {
    let mut i = 0;
    if !bom.is_empty() {
        if !head.starts_with(bom) {
            return None;
        }
        i = bom.len();
    }

    for expected in b"@charset \"" {
        if match_group(head, i, stride, pos)? != *expected {
            return None;
        }
        i += stride;
    }

    let mut name = String::new();
    loop {
        let b = match_group(head, i, stride, pos)?;
        i += stride;
        match b {
            b'"' => break,
            b'\n' | b'\r' => return None,
            _ => name.push(b as char),
        }
        if name.len() > SNIFF_LIMIT {
            return None;
        }
    }
    if name.is_empty() {
        return None;
    }

    if match_group(head, i, stride, pos)? != b';' {
        return None;
    }
    Some(name)
}

/// The byte-pattern table. Returns the detected encoding name and whether a
/// matching `@charset` rule is required in the parsed stylesheet.
fn sniff(head: &[u8]) -> Option<(String, bool)> {
    const BOM8: &[u8] = b"\xEF\xBB\xBF";
    const BOM16_BE: &[u8] = b"\xFE\xFF";
    const BOM16_LE: &[u8] = b"\xFF\xFE";
    const BOM32_BE: &[u8] = b"\x00\x00\xFE\xFF";
    const BOM32_LE: &[u8] = b"\xFF\xFE\x00\x00";
    const BOM32_2143: &[u8] = b"\x00\x00\xFF\xFE";
    const BOM32_3412: &[u8] = b"\xFE\xFF\x00\x00";

    if let Some(name) = widened_charset(head, BOM8, 1, 0) {
        return Some((name, true));
    }
    if head.starts_with(BOM8) {
        return Some((DEFAULT_ENCODING.to_string(), false));
    }
    if let Some(name) = widened_charset(head, b"", 1, 0) {
        return Some((name, true));
    }

    let widened_patterns: [(&[u8], usize, usize); 12] = [
        (BOM16_BE, 2, 1),
        (b"", 2, 1),
        (BOM16_LE, 2, 0),
        (b"", 2, 0),
        (BOM32_BE, 4, 3),
        (b"", 4, 3),
        (BOM32_2143, 4, 2),
        (b"", 4, 2),
        (BOM32_3412, 4, 1),
        (b"", 4, 1),
        (BOM32_LE, 4, 0),
        (b"", 4, 0),
    ];
    for (bom, stride, pos) in widened_patterns {
        if let Some(name) = widened_charset(head, bom, stride, pos) {
            return Some((name, true));
        }
    }

    // BOM-only detection; 32-bit first, their BOMs contain the 16-bit ones
    for (bom, name) in [
        (BOM32_BE, "utf-32-be"),
        (BOM32_LE, "utf-32-le"),
        (BOM32_2143, "utf-32-2143"),
        (BOM32_3412, "utf-32-3412"),
        (BOM16_BE, "utf-16-be"),
        (BOM16_LE, "utf-16-le"),
    ] {
        if head.starts_with(bom) {
            return Some((name.to_string(), false));
        }
    }

    None
}

/// Decodes raw stylesheet bytes
pub fn read_bytes(
    bytes: &[u8],
    source_encoding: Option<&str>,
    default_encoding: Option<&str>,
) -> CssResult<ReadOutcome> {
    let forced_encoding = source_encoding.is_some();
    let mut charset_rule_required = false;

    let label = match source_encoding {
        Some(label) => label.to_string(),
        None => {
            let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
            match sniff(head) {
                Some((name, required)) => {
                    charset_rule_required = required;
                    name
                }
                None => default_encoding.unwrap_or(DEFAULT_ENCODING).to_string(),
            }
        }
    };

    let encoding = lookup_encoding(&label)?;
    let (text, used, _had_errors) = encoding.decode(bytes);

    Ok(ReadOutcome {
        text: text.into_owned(),
        encoding: used,
        charset_rule_required,
        forced_encoding,
    })
}

/// Reads and decodes a stylesheet file. The file is read in one scoped
/// binary pass; the sniff and the decode share the buffer.
pub fn read_file(
    path: &Path,
    source_encoding: Option<&str>,
    default_encoding: Option<&str>,
) -> CssResult<ReadOutcome> {
    let bytes = std::fs::read(path)?;
    read_bytes(&bytes, source_encoding, default_encoding)
}

/// Wraps an already-decoded string. Only a textual `@charset "...";` prefix
/// is checked: the named encoding must be known and a matching charset rule
/// is then required of the parse.
pub fn read_str(
    data: &str,
    source_encoding: Option<&str>,
    default_encoding: Option<&str>,
) -> CssResult<ReadOutcome> {
    let forced_encoding = source_encoding.is_some();
    let mut charset_rule_required = false;

    let label = match source_encoding {
        Some(label) => label.to_string(),
        None => match data
            .strip_prefix("@charset \"")
            .and_then(|rest| rest.split_once('"'))
            .filter(|(name, rest)| {
                !name.is_empty()
                    && !name.contains(['\n', '\r'])
                    && rest.starts_with(';')
            }) {
            Some((name, _)) => {
                charset_rule_required = true;
                name.to_string()
            }
            None => default_encoding.unwrap_or(DEFAULT_ENCODING).to_string(),
        },
    };

    let encoding = lookup_encoding(&label)?;

    Ok(ReadOutcome {
        text: data.to_string(),
        encoding,
        charset_rule_required,
        forced_encoding,
    })
}

/// Encodes output text, writing characters the destination encoding cannot
/// represent as CSS `\hhhhhh` escapes (six hex digits, no trailing space).
#[must_use]
pub fn encode_css(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 16);
    let mut buf = [0u8; 1024];
    let mut src = text;
    let mut last = false;

    loop {
        let (result, read, written) = encoder.encode_from_utf8_without_replacement(src, &mut buf, last);
        out.extend_from_slice(&buf[..written]);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => {
                if last {
                    break;
                }
                if src.is_empty() {
                    last = true;
                }
            }
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(c) => {
                out.extend_from_slice(format!("\\{:06X}", c as u32).as_bytes());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widen(s: &str, stride: usize, pos: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for c in s.bytes() {
            for k in 0..stride {
                out.push(if k == pos { c } else { 0 });
            }
        }
        out
    }

    #[test]
    fn plain_ascii_defaults_to_utf8() {
        let outcome = read_bytes(b"a { x: 1; }", None, None).unwrap();
        assert_eq!(outcome.encoding.name(), "UTF-8");
        assert!(!outcome.charset_rule_required);
        assert!(!outcome.forced_encoding);
    }

    #[test]
    fn charset_rule_sets_encoding_and_requires_rule() {
        let outcome = read_bytes(b"@charset \"iso-8859-1\";\na {}", None, None).unwrap();
        assert_eq!(outcome.encoding.name(), "windows-1252");
        assert!(outcome.charset_rule_required);
    }

    #[test]
    fn utf8_bom_without_charset() {
        let outcome = read_bytes(b"\xEF\xBB\xBFa {}", None, None).unwrap();
        assert_eq!(outcome.encoding.name(), "UTF-8");
        assert!(!outcome.charset_rule_required);
        // the BOM does not leak into the text
        assert!(outcome.text.starts_with('a'));
    }

    #[test]
    fn utf16_be_charset_rule() {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(widen("@charset \"utf-16-be\";a{}", 2, 1));
        let outcome = read_bytes(&bytes, None, None).unwrap();
        assert_eq!(outcome.encoding.name(), "UTF-16BE");
        assert!(outcome.charset_rule_required);
    }

    #[test]
    fn utf16_le_without_bom() {
        let bytes = widen("@charset \"utf-16-le\";a{}", 2, 0);
        let outcome = read_bytes(&bytes, None, None).unwrap();
        assert_eq!(outcome.encoding.name(), "UTF-16LE");
        assert!(outcome.charset_rule_required);
    }

    #[test]
    fn utf32_patterns_are_detected_but_unsupported() {
        let bytes = widen("@charset \"utf-32-be\";", 4, 3);
        let err = read_bytes(&bytes, None, None).unwrap_err();
        assert!(matches!(err, CssError::EncodingNotFound(_)));

        let err = read_bytes(b"\x00\x00\xFE\xFFrest", None, None).unwrap_err();
        assert!(matches!(err, CssError::EncodingNotFound(_)));
    }

    #[test]
    fn forced_encoding_skips_the_sniff() {
        let outcome =
            read_bytes(b"@charset \"utf-16-be\";a{}", Some("utf-8"), None).unwrap();
        assert_eq!(outcome.encoding.name(), "UTF-8");
        assert!(outcome.forced_encoding);
        assert!(!outcome.charset_rule_required);
    }

    #[test]
    fn unknown_encoding_name_fails() {
        let err = read_bytes(b"@charset \"no-such-enc\";", None, None).unwrap_err();
        match err {
            CssError::EncodingNotFound(name) => assert_eq!(name, "no-such-enc"),
            other => panic!("expected EncodingNotFound, got {other:?}"),
        }
    }

    #[test]
    fn underscore_labels_are_accepted() {
        assert_eq!(lookup_encoding("utf_8").unwrap().name(), "UTF-8");
    }

    #[test]
    fn string_reader_charset_prefix() {
        let outcome = read_str("@charset \"utf-8\";a{}", None, None).unwrap();
        assert!(outcome.charset_rule_required);
        assert_eq!(outcome.encoding.name(), "UTF-8");

        let outcome = read_str("a{}", None, None).unwrap();
        assert!(!outcome.charset_rule_required);
    }

    #[test]
    fn encode_escapes_unrepresentable_characters() {
        let encoding = lookup_encoding("ascii").unwrap();
        let bytes = encode_css("a { content: \"\u{2603}\"; }", encoding);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\\002603"), "{text}");
    }

    #[test]
    fn encode_utf8_round_trips() {
        let encoding = lookup_encoding("utf-8").unwrap();
        let bytes = encode_css("a { x: 1; } /* ünïcode */", encoding);
        assert_eq!(bytes, "a { x: 1; } /* ünïcode */".as_bytes());
    }
}
