// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Codec for the JVM `.properties` format.
//!
//! Input is ISO-8859-1: every byte is one character, anything else arrives as
//! a `\uXXXX` escape. Logical lines may be continued with an odd number of
//! trailing backslashes; `#` and `!` start comment lines; keys end at the
//! first unescaped `=`, `:` or blank.
//!
//! Output is pure ASCII and escapes the same characters the JVM's
//! `Properties.store` does. Entries keep document order so a stored file is
//! reproducible. The timestamp comment the JVM adds is not written.

use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised while reading a properties document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertiesError {
    /// A `\u` escape was not followed by four hex digits.
    #[error("malformed \\uxxxx encoding on line {line}")]
    MalformedUnicodeEscape {
        /// 1-based line where the logical line containing the escape starts.
        line: usize,
    },
}

/// Ordered key/value property set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: IndexMap<String, String>,
}

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a properties document. A repeated key keeps its first position
    /// and its last value.
    pub fn load(bytes: &[u8]) -> Result<Self, PropertiesError> {
        let mut entries = IndexMap::new();
        for (line, logical) in logical_lines(bytes) {
            let (key, value) = split_entry(&logical);
            entries.insert(unescape(key, line)?, unescape(value, line)?);
        }
        Ok(Self { entries })
    }

    /// Value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize with an optional leading comment (one `#` line per comment
    /// line).
    pub fn store(&self, comment: Option<&str>) -> Vec<u8> {
        let mut out = String::new();
        if let Some(comment) = comment {
            for line in comment.lines() {
                out.push('#');
                for unit in line.encode_utf16() {
                    match char::from_u32(u32::from(unit)) {
                        Some(c) if c == ' ' || c.is_ascii_graphic() => out.push(c),
                        _ => push_unicode_escape(&mut out, unit),
                    }
                }
                out.push('\n');
            }
        }
        for (key, value) in &self.entries {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }
        out.into_bytes()
    }
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\x0c')
}

fn trim_blank_start(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|&b| !is_blank(b)).unwrap_or(line.len());
    &line[start..]
}

fn natural_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&bytes[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&bytes[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&bytes[start..]);
    }
    lines
}

fn continues(line: &[u8]) -> bool {
    line.iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

/// Joins continued natural lines; yields `(first line number, logical line)`.
fn logical_lines(bytes: &[u8]) -> Vec<(usize, Vec<u8>)> {
    let mut out = Vec::new();
    let mut natural = natural_lines(bytes).into_iter().enumerate();
    while let Some((index, raw)) = natural.next() {
        let line = trim_blank_start(raw);
        if line.is_empty() || line[0] == b'#' || line[0] == b'!' {
            continue;
        }
        let mut logical = line.to_vec();
        while continues(&logical) {
            logical.pop();
            match natural.next() {
                Some((_, next)) => logical.extend_from_slice(trim_blank_start(next)),
                None => break,
            }
        }
        out.push((index + 1, logical));
    }
    out
}

fn split_entry(line: &[u8]) -> (&[u8], &[u8]) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;
    for (i, &b) in line.iter().enumerate() {
        if !escaped && (b == b'=' || b == b':') {
            key_end = i;
            value_start = i + 1;
            has_separator = true;
            break;
        }
        if !escaped && is_blank(b) {
            key_end = i;
            value_start = i + 1;
            break;
        }
        escaped = b == b'\\' && !escaped;
    }
    while let Some(&b) = line.get(value_start) {
        if !is_blank(b) {
            if !has_separator && (b == b'=' || b == b':') {
                has_separator = true;
            } else {
                break;
            }
        }
        value_start += 1;
    }
    (&line[..key_end], &line[value_start..])
}

fn unescape(raw: &[u8], line: usize) -> Result<String, PropertiesError> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            units.push(u16::from(b));
            continue;
        }
        let Some(escaped) = bytes.next() else {
            break;
        };
        let unit = match escaped {
            b'u' => {
                let hex: Vec<u8> = bytes.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(PropertiesError::MalformedUnicodeEscape { line });
                }
                let digits = String::from_utf8_lossy(&hex);
                u16::from_str_radix(&digits, 16)
                    .map_err(|_| PropertiesError::MalformedUnicodeEscape { line })?
            }
            b't' => u16::from(b'\t'),
            b'r' => u16::from(b'\r'),
            b'n' => u16::from(b'\n'),
            b'f' => 0x0c,
            other => u16::from(other),
        };
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}

fn push_unicode_escape(out: &mut String, unit: u16) {
    out.push_str(&format!("\\u{unit:04X}"));
}

fn escape_into(out: &mut String, text: &str, escape_space: bool) {
    for (index, unit) in text.encode_utf16().enumerate() {
        match char::from_u32(u32::from(unit)) {
            Some(' ') if index == 0 || escape_space => out.push_str("\\ "),
            Some('\t') => out.push_str("\\t"),
            Some('\n') => out.push_str("\\n"),
            Some('\r') => out.push_str("\\r"),
            Some('\x0c') => out.push_str("\\f"),
            Some(c @ ('\\' | '=' | ':' | '#' | '!')) => {
                out.push('\\');
                out.push(c);
            }
            Some(c) if c == ' ' || c.is_ascii_graphic() => out.push(c),
            _ => push_unicode_escape(out, unit),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load(text: &str) -> Properties {
        Properties::load(text.as_bytes()).unwrap()
    }

    #[test]
    fn parses_separators_and_comments() {
        let props = load("# comment\n! bang\n\na=1\nb : 2\nc 3\n  d=\ne\n");
        let entries: Vec<_> = props.iter().collect();
        assert_eq!(
            entries,
            vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", ""), ("e", "")]
        );
    }

    #[test]
    fn joins_continued_lines() {
        let text = "Args = \\\n    -H:X=y \\\n    --initialize-at-run-time=a.b.c \\\n";
        let props = load(text);
        assert_eq!(
            props.get("Args"),
            Some("-H:X=y --initialize-at-run-time=a.b.c ")
        );
    }

    #[test]
    fn even_backslashes_do_not_continue() {
        let props = load("a=x\\\\\nb=y\n");
        assert_eq!(props.get("a"), Some("x\\"));
        assert_eq!(props.get("b"), Some("y"));
    }

    #[test]
    fn handles_crlf_and_cr() {
        let props = load("a=1\r\nb=2\rc=3");
        assert_eq!(props.len(), 3);
        assert_eq!(props.get("c"), Some("3"));
    }

    #[test]
    fn decodes_escapes() {
        let props = load("k\\=ey=tab\\there\\u00e9\\q\n");
        assert_eq!(props.get("k=ey"), Some("tab\there\u{e9}q"));
    }

    #[test]
    fn decodes_surrogate_pairs() {
        let props = load("smile=\\uD83D\\uDE00\n");
        assert_eq!(props.get("smile"), Some("\u{1F600}"));
    }

    #[test]
    fn rejects_malformed_unicode_escape() {
        let err = Properties::load(b"a=1\nb=\\u12G4\n").unwrap_err();
        assert_eq!(err, PropertiesError::MalformedUnicodeEscape { line: 2 });
        assert!(Properties::load(b"b=\\u12").is_err());
    }

    #[test]
    fn latin1_bytes_are_characters() {
        let props = Properties::load(b"name=caf\xe9\n").unwrap();
        assert_eq!(props.get("name"), Some("caf\u{e9}"));
        let c1 = Properties::load(b"sign=\x80\x9f\n").unwrap();
        assert_eq!(c1.get("sign"), Some("\u{80}\u{9f}"));
    }

    #[test]
    fn store_escapes_like_the_jvm() {
        let mut props = Properties::new();
        props.set("Args", "-H:X=y --initialize-at-run-time=a.b.c_rel");
        props.set("my key", " lead#!\\");
        props.set("uni", "\u{e9}\u{1F600}");
        let text = String::from_utf8(props.store(Some("Relocated by test"))).unwrap();
        assert_eq!(
            text,
            "#Relocated by test\n\
             Args=-H\\:X\\=y --initialize-at-run-time\\=a.b.c_rel\n\
             my\\ key=\\ lead\\#\\!\\\\\n\
             uni=\\u00E9\\uD83D\\uDE00\n"
        );
    }

    #[test]
    fn stored_output_loads_back() {
        let mut props = Properties::new();
        props.set("a key", "x = y : z\t# !");
        props.set("b", "\u{e9}");
        let reloaded = Properties::load(&props.store(None)).unwrap();
        assert_eq!(reloaded, props);
    }
}
