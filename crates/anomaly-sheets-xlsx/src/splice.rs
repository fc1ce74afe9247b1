//! Byte-level XML edits
//!
//! Parts are patched by splicing new bytes into the original document at
//! positions reported by the quick-xml reader, so everything that isn't
//! edited stays byte-for-byte identical.

use quick_xml::events::BytesStart;

use crate::error::{XlsxError, XlsxResult};

/// A single replacement of `src[start..end]`
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    pub start: usize,
    pub end: usize,
    pub bytes: Vec<u8>,
}

impl Edit {
    pub fn replace(start: usize, end: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            start,
            end,
            bytes: bytes.into(),
        }
    }

    pub fn insert(at: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self::replace(at, at, bytes)
    }
}

/// Apply non-overlapping edits to `src`.
///
/// Inserts at the same position keep their relative order.
pub(crate) fn apply_edits(src: &[u8], mut edits: Vec<Edit>) -> XlsxResult<Vec<u8>> {
    edits.sort_by_key(|e| e.start);

    let extra: usize = edits.iter().map(|e| e.bytes.len()).sum();
    let mut out = Vec::with_capacity(src.len() + extra);
    let mut copied = 0;

    for edit in edits {
        if edit.start < copied || edit.end < edit.start || edit.end > src.len() {
            return Err(XlsxError::Parse(format!(
                "overlapping XML edit at byte {}",
                edit.start
            )));
        }
        out.extend_from_slice(&src[copied..edit.start]);
        out.extend_from_slice(&edit.bytes);
        copied = edit.end;
    }
    out.extend_from_slice(&src[copied..]);
    Ok(out)
}

/// Render a start tag, replacing or adding attributes in `set` and
/// dropping those in `remove`.
///
/// Untouched attribute values are written back exactly as they were
/// escaped in the source.
pub(crate) fn render_start_tag(
    e: &BytesStart<'_>,
    set: &[(&str, String)],
    remove: &[&str],
    self_closing: bool,
) -> XlsxResult<Vec<u8>> {
    let mut out = Vec::with_capacity(e.name().as_ref().len() + 64);
    out.push(b'<');
    out.extend_from_slice(e.name().as_ref());

    let mut pending: Vec<&(&str, String)> = set.iter().collect();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if remove.iter().any(|r| r.as_bytes() == key) {
            continue;
        }
        out.push(b' ');
        out.extend_from_slice(key);
        out.extend_from_slice(b"=\"");
        match pending.iter().position(|(k, _)| k.as_bytes() == key) {
            Some(idx) => {
                let (_, value) = pending.remove(idx);
                out.extend_from_slice(escape_attr(value).as_bytes());
            }
            None => out.extend_from_slice(&attr.value),
        }
        out.push(b'"');
    }
    for (key, value) in pending {
        out.push(b' ');
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(value).as_bytes());
        out.push(b'"');
    }

    out.extend_from_slice(if self_closing { &b"/>"[..] } else { &b">"[..] });
    Ok(out)
}

/// Escape a value for a double-quoted attribute
pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Unescaped value of the attribute `key`, if present
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> XlsxResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
