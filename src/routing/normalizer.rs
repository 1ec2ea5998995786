//! Percent-encoding normalization for path segments.
//!
//! # Responsibilities
//! - Canonicalize static segments at declaration time and lookup paths at
//!   recognition time so both sides compare equal
//! - Encode dynamic parameter values for generated paths
//! - Decode query-string parts and dynamic parameter values
//!
//! # Design Decisions
//! - `%` and `/` always stay percent-encoded inside a segment; everything
//!   else is decoded, so `%3a`, `%3A` and `:` normalize identically
//! - Normalization is idempotent
//! - Escapes are emitted in upper case

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched by component encoding:
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Path segments additionally keep the RFC 3986 sub-delims and `:` `@` literal.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &COMPONENT_ENCODE_SET
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Characters whose escapes survive URI decoding.
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Normalize every `/`-separated segment of `path`.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(normalize_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a single segment, then re-encode only `%` and `/`.
///
/// A segment that cannot be decoded is returned verbatim.
pub fn normalize_segment(segment: &str) -> Cow<'_, str> {
    match decode_component(segment) {
        Some(decoded) if decoded.contains(['%', '/']) => {
            Cow::Owned(decoded.replace('%', "%25").replace('/', "%2F"))
        }
        Some(decoded) => Cow::Owned(decoded.into_owned()),
        None => Cow::Borrowed(segment),
    }
}

/// Encode a dynamic parameter value for use as one path segment.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
}

/// Encode a query-string key or value.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_ENCODE_SET).to_string()
}

/// Fully decode a component.
///
/// Returns `None` for a malformed escape (`%` not followed by two hex
/// digits) or when the decoded bytes are not UTF-8.
pub fn decode_component(value: &str) -> Option<Cow<'_, str>> {
    if !has_well_formed_escapes(value) {
        return None;
    }
    percent_decode_str(value).decode_utf8().ok()
}

/// Decode a whole URI, keeping the escapes of reserved characters intact.
///
/// Input that cannot be decoded is returned verbatim.
pub fn decode_uri(value: &str) -> Cow<'_, str> {
    if !value.contains('%') || !has_well_formed_escapes(value) {
        return Cow::Borrowed(value);
    }

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let decoded = hex_value(bytes[i + 1]) * 16 + hex_value(bytes[i + 2]);
            if URI_RESERVED.contains(&decoded) {
                out.extend_from_slice(&bytes[i..i + 3]);
            } else {
                out.push(decoded);
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    match String::from_utf8(out) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(value),
    }
}

fn has_well_formed_escapes(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

// Callers guarantee `byte` is an ASCII hex digit.
fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => byte - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalizes(paths: &[&str], expected: &str) {
        for path in paths {
            assert_eq!(normalize_path(path), expected, "normalizing {}", path);
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_normalizes(&["/foo/bar"], "/foo/bar");
        assert_normalizes(&["/foo%3Abar", "/foo%3abar"], "/foo:bar");
        assert_normalizes(&["/foo%2fbar", "/foo%2Fbar"], "/foo%2Fbar");
        assert_normalizes(&["/café", "/caf%C3%A9", "/caf%c3%a9"], "/café");
        assert_normalizes(&["/abc%25def"], "/abc%25def");
        assert_normalizes(&["/%25%25%25%25"], "/%25%25%25%25");
        assert_normalizes(&["/%25%25%25%25%3A%3a%2F%2f%2f"], "/%25%25%25%25::%2F%2F%2F");
    }

    #[test]
    fn test_normalize_encoded_url() {
        let encoded = encode_component("http://example.com/index.html?foo=100%&baz=boo#hash");
        assert_eq!(
            normalize_path(&format!("/{}", encoded)),
            "/http:%2F%2Fexample.com%2Findex.html?foo=100%25&baz=boo#hash"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_path("/caf%c3%a9/a%2fb/100%25");
        assert_eq!(normalize_path(&once), once);
    }

    #[test]
    fn test_malformed_segment_kept_verbatim() {
        assert_eq!(normalize_segment("100%"), "100%");
        assert_eq!(normalize_segment("%zz"), "%zz");
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_segment("$&+,;=:@"), "$&+,;=:@");
        assert_eq!(encode_path_segment("café"), "caf%C3%A9");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b").as_deref(), Some("a b"));
        assert_eq!(decode_component("%E2%9C%93").as_deref(), Some("✓"));
        assert_eq!(decode_component("%"), None);
        assert_eq!(decode_component("%C3"), None);
    }

    #[test]
    fn test_decode_uri_keeps_reserved() {
        assert_eq!(decode_uri("caf%C3%A9/a%2Fb%3F"), "café/a%2Fb%3F");
        assert_eq!(decode_uri("plain"), "plain");
        assert_eq!(decode_uri("bad%"), "bad%");
    }
}
