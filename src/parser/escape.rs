// COPY-format escape codec. pg_dump writes one row per line, fields separated
// by tabs, with control characters backslash-escaped and NULL spelled as the
// two-character sequence \N.

/// Decode one raw COPY field. A field whose raw text is exactly `\N` is NULL.
///
/// Note the documented ambiguity: a value whose *content* is the two
/// characters `\N` would have been written unescaped by a sloppy producer and
/// is then indistinguishable from NULL. This reader treats it as NULL.
pub fn decode_field(raw: &str) -> Option<String> {
    if raw == "\\N" {
        None
    } else {
        Some(unescape_copy(raw))
    }
}

/// Encode a field value back into raw COPY text.
#[allow(dead_code)]
pub fn encode_field(value: Option<&str>) -> String {
    match value {
        None => "\\N".to_string(),
        Some(v) => escape_copy(v),
    }
}

// Decode the COPY backslash escapes in a single pass. A backslash followed by
// an unknown character is kept verbatim (both characters), matching how the
// dump would round-trip text this parser never produced.
pub fn unescape_copy(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('v') => out.push('\u{000B}'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// Inverse of unescape_copy for the characters COPY cannot carry literally.
pub fn escape_copy(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\u{000B}' => out.push_str("\\v"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_escaped_characters() {
        let values = [
            "plain",
            "tab\there",
            "line\nbreak",
            "back\\slash",
            "cr\rlf\n",
            "mix \\ of \t all \u{000B}\u{000C}\u{0008}",
            "\\N", // literal backslash-N as *content* survives when escaped
            "",
        ];
        for v in values {
            assert_eq!(unescape_copy(&escape_copy(v)), v, "value {:?}", v);
        }
    }

    #[test]
    fn field_round_trip_through_encode_decode() {
        assert_eq!(decode_field(&encode_field(Some("a\tb"))), Some("a\tb".to_string()));
        assert_eq!(decode_field(&encode_field(None)), None);
        // Content "\N" encodes to "\\N" (escaped backslash) and comes back intact.
        assert_eq!(decode_field(&encode_field(Some("\\N"))), Some("\\N".to_string()));
    }

    #[test]
    fn raw_backslash_n_reads_as_null() {
        // The ambiguity is part of the format: a raw field that is exactly the
        // two characters \N is NULL, even if a producer meant it as text.
        assert_eq!(decode_field("\\N"), None);
        // But \N embedded in a longer field is just an unknown escape.
        assert_eq!(decode_field("x\\N"), Some("x\\N".to_string()));
    }

    #[test]
    fn unknown_escapes_and_trailing_backslash_kept() {
        assert_eq!(unescape_copy("a\\qb"), "a\\qb");
        assert_eq!(unescape_copy("end\\"), "end\\");
    }
}
