//! UTF-16 text measurement
//!
//! Every count in an operation (retain counts, insert and delete lengths,
//! columns) is measured in UTF-16 code units, which is what editors on the
//! JavaScript side report. These helpers translate between those units and
//! Rust's UTF-8 byte offsets.

/// Length of `text` in UTF-16 code units
pub fn len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte offset of the given UTF-16 offset
///
/// Returns `None` when `units` runs past the end of `text` or lands inside a
/// surrogate pair.
pub fn byte_offset(text: &str, units: usize) -> Option<usize> {
    let mut seen = 0;
    for (idx, ch) in text.char_indices() {
        if seen == units {
            return Some(idx);
        }
        seen += ch.len_utf16();
        if seen > units {
            return None;
        }
    }
    (seen == units).then_some(text.len())
}

/// Split `text` after `units` UTF-16 code units
pub fn split_at(text: &str, units: usize) -> Option<(&str, &str)> {
    byte_offset(text, units).map(|idx| text.split_at(idx))
}

pub(crate) fn ends_line(text: &str) -> bool {
    text.ends_with('\n')
}
