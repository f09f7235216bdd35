//! In-memory plain-text document
//!
//! [`TextDocument`] keeps its text in a rope and addresses it by line and
//! UTF-16 column, the coordinates operations are expressed in. Local edits
//! return a [`TextChange`] that converts into the operation to send to the
//! other peers, and remote operations are replayed with
//! [`TextDocument::apply`].
//!
//! # Example
//!
//! ```
//! use synckit_ot::TextDocument;
//!
//! let mut local = TextDocument::from_text("hello\n");
//! let mut remote = local.clone();
//!
//! let op = local.insert_op(0, 5, " world").unwrap();
//! remote.apply(&op).unwrap();
//!
//! assert_eq!(remote.text(), "hello world\n");
//! ```

mod text_change;

pub use text_change::{doc_op_from_changes, TextChange, TextChangeKind};

use crate::error::{OpError, Result};
use crate::ot::{self, DocOp, DocumentLines, DocumentMutator, Position};
use ropey::{Rope, RopeSlice};
use std::fmt;

/// Line-addressed text buffer
///
/// Lines are separated by `\n` only. A document always has at least one
/// line; text ending with a newline has an empty last line.
#[derive(Debug, Clone)]
pub struct TextDocument {
    rope: Rope,
}

impl TextDocument {
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of a line, including its terminating newline
    pub fn line(&self, line_number: usize) -> Option<String> {
        self.rope.get_line(line_number).map(|line| line.to_string())
    }

    /// Insert `text` at `column` of line `line_number`
    pub fn insert(&mut self, line_number: usize, column: usize, text: &str) -> Result<TextChange> {
        let at = self.char_index(line_number, column)?;
        self.rope
            .try_insert(at, text)
            .map_err(|e| OpError::Apply(e.to_string()))?;

        tracing::trace!(line_number, column, len = text.len(), "inserted text");
        Ok(TextChange::insertion(line_number, column, text))
    }

    /// Delete `count` UTF-16 code units starting at `column` of line
    /// `line_number`
    ///
    /// The deleted range may span several lines.
    pub fn delete(&mut self, line_number: usize, column: usize, count: usize) -> Result<TextChange> {
        let start = self.char_index(line_number, column)?;
        let start_unit = self.rope.char_to_utf16_cu(start);
        let end_unit = start_unit + count;
        if end_unit > self.rope.len_utf16_cu() {
            return Err(OpError::Apply(format!(
                "deleting {} units at {}:{} runs past the end of the document",
                count, line_number, column
            )));
        }

        let end = self.rope.utf16_cu_to_char(end_unit);
        if self.rope.char_to_utf16_cu(end) != end_unit {
            return Err(OpError::Apply(format!(
                "deleting {} units at {}:{} splits a surrogate pair",
                count, line_number, column
            )));
        }

        let removed = self.rope.slice(start..end).to_string();
        self.rope
            .try_remove(start..end)
            .map_err(|e| OpError::Apply(e.to_string()))?;

        tracing::trace!(line_number, column, count, "deleted text");
        Ok(TextChange::deletion(line_number, column, removed))
    }

    /// Insert text and return the operation describing the edit
    pub fn insert_op(&mut self, line_number: usize, column: usize, text: &str) -> Result<DocOp> {
        let change = self.insert(line_number, column, text)?;
        Ok(change.to_doc_op(self))
    }

    /// Delete text and return the operation describing the edit
    pub fn delete_op(&mut self, line_number: usize, column: usize, count: usize) -> Result<DocOp> {
        let change = self.delete(line_number, column, count)?;
        Ok(change.to_doc_op(self))
    }

    /// Apply an operation
    ///
    /// The document is left untouched when the operation does not fit it.
    pub fn apply(&mut self, op: &DocOp) -> Result<()> {
        let mut scratch = self.clone();
        ot::apply(op, &mut scratch).map_err(|e| {
            tracing::debug!(op = %op, error = %e, "operation does not fit document");
            e
        })?;
        self.rope = scratch.rope;
        Ok(())
    }

    /// Line and column of a UTF-16 offset into the document
    pub fn position_at(&self, offset: usize) -> Option<Position> {
        if offset > self.rope.len_utf16_cu() {
            return None;
        }
        let char_index = self.rope.utf16_cu_to_char(offset);
        let line = self.rope.char_to_line(char_index);
        let line_start = self.rope.char_to_utf16_cu(self.rope.line_to_char(line));
        Some(Position::new(line, offset - line_start))
    }

    /// UTF-16 offset of a line and column
    pub fn offset_of(&self, position: Position) -> Result<usize> {
        let at = self.char_index(position.line, position.column)?;
        Ok(self.rope.char_to_utf16_cu(at))
    }

    fn char_index(&self, line: usize, column: usize) -> Result<usize> {
        let out_of_range = || OpError::Position { line, column };
        let slice = self.rope.get_line(line).ok_or_else(out_of_range)?;

        if column > content_len(slice) {
            return Err(out_of_range());
        }
        let char_in_line = slice.utf16_cu_to_char(column);
        if slice.char_to_utf16_cu(char_in_line) != column {
            return Err(out_of_range());
        }

        Ok(self.rope.line_to_char(line) + char_in_line)
    }
}

/// UTF-16 length of a line without its newline
fn content_len(line: RopeSlice<'_>) -> usize {
    let chars = line.len_chars();
    let ends_line = chars > 0 && line.char(chars - 1) == '\n';
    line.len_utf16_cu() - usize::from(ends_line)
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextDocument {
    fn eq(&self, other: &Self) -> bool {
        self.rope == other.rope
    }
}

impl Eq for TextDocument {}

impl From<&str> for TextDocument {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Display for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rope)
    }
}

impl DocumentLines for TextDocument {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line_number: usize) -> Option<String> {
        self.line(line_number)
    }
}

impl DocumentMutator for TextDocument {
    fn insert_text(&mut self, line_number: usize, column: usize, text: &str) -> Result<()> {
        self.insert(line_number, column, text).map(|_| ())
    }

    fn delete_text(&mut self, line_number: usize, column: usize, count: usize) -> Result<()> {
        self.delete(line_number, column, count).map(|_| ())
    }
}
