//! Text helpers shared by the markup and pruning passes.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset>` or HTTP headers)
/// 3. Falls back to Windows-1252 (the de-facto default for legacy pages)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Append `text` to `buf`, collapsing every whitespace sequence to one space.
///
/// Boundary whitespace is kept as a single separator so that
/// `"Hello "` followed by `"world"` reads `"Hello world"`, while a
/// leading space is never emitted into an empty buffer.
pub fn push_collapsed(buf: &mut String, text: &str) {
    let has_leading = text.starts_with(char::is_whitespace);
    let has_trailing = text.ends_with(char::is_whitespace);
    let mut words = text.split_whitespace().peekable();

    if words.peek().is_none() {
        if !text.is_empty() && !buf.is_empty() && !buf.ends_with(' ') {
            buf.push(' ');
        }
        return;
    }

    if has_leading && !buf.is_empty() && !buf.ends_with(' ') {
        buf.push(' ');
    }
    let mut first = true;
    for word in words {
        if !first {
            buf.push(' ');
        }
        buf.push_str(word);
        first = false;
    }
    if has_trailing {
        buf.push(' ');
    }
}
