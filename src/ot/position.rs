//! Position transformation
//!
//! Re-anchors a `(line, column)` position (cursor, selection end, marker)
//! through an operation applied to the document the position lives in.
//!
//! Inserts before the position move it forward, deletes before it move it
//! back and a delete that covers it collapses it to the start of the deleted
//! range. Text inserted exactly at the position does not carry it forward
//! unless the transformer is built with [`InsertBias::Advance`].
//!
//! # Example
//!
//! ```
//! use synckit_ot::{doc_op, Position, PositionTransformer};
//!
//! // "hello world": "big " is typed before "world"
//! let op = doc_op![r(6), i("big "), r(5)];
//! let mut cursor = PositionTransformer::new(0, 8);
//! cursor.transform(&op);
//!
//! assert_eq!(cursor.position(), Position::new(0, 12));
//! ```

use super::component::Component;
use super::doc_op::DocOp;
use super::text;
use serde::{Deserialize, Serialize};

/// A point between two characters of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line number
    pub line: usize,
    /// Zero-based column, in UTF-16 code units
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Where a position ends up when text is inserted exactly at it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertBias {
    /// The position stays before the inserted text
    #[default]
    Stay,
    /// The position moves past the inserted text
    Advance,
}

/// A position that follows the operations applied to its document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTransformer {
    position: Position,
    bias: InsertBias,
}

impl PositionTransformer {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            position: Position::new(line, column),
            bias: InsertBias::default(),
        }
    }

    pub fn with_insert_bias(mut self, bias: InsertBias) -> Self {
        self.bias = bias;
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line_number(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Move the position to its image after `op`
    pub fn transform(&mut self, op: &DocOp) {
        self.position = transform_position(self.position, op, self.bias);
    }
}

/// Cursor pair walking the source document and the resulting document
#[derive(Debug, Default)]
struct Walk {
    line: usize,
    column: usize,
    out_line: usize,
    out_column: usize,
}

impl Walk {
    /// Image of a target on the current source line, at or after the cursor
    fn on_current_line(&self, target: Position) -> Position {
        Position::new(self.out_line, self.out_column + target.column - self.column)
    }

    fn next_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.out_line += 1;
        self.out_column = 0;
    }
}

/// Image of `position` after `op` is applied
pub fn transform_position(position: Position, op: &DocOp, bias: InsertBias) -> Position {
    let mut walk = Walk::default();

    for component in op {
        let on_line = walk.line == position.line;
        match component {
            Component::Retain {
                count,
                ends_with_newline,
            } => {
                if on_line && position.column < walk.column + count {
                    return walk.on_current_line(position);
                }
                if *ends_with_newline {
                    walk.next_line();
                } else {
                    walk.column += count;
                    walk.out_column += count;
                }
            }
            Component::RetainLine { line_count } => {
                if position.line < walk.line + line_count {
                    if on_line {
                        return walk.on_current_line(position);
                    }
                    return Position::new(
                        walk.out_line + position.line - walk.line,
                        position.column,
                    );
                }
                walk.line += line_count;
                walk.column = 0;
                walk.out_line += line_count;
                walk.out_column = 0;
            }
            Component::Insert { text: inserted } => {
                let at_position = on_line && walk.column == position.column;
                if at_position && bias == InsertBias::Stay {
                    return Position::new(walk.out_line, walk.out_column);
                }
                if text::ends_line(inserted) {
                    walk.out_line += 1;
                    walk.out_column = 0;
                } else {
                    walk.out_column += text::len(inserted);
                }
            }
            Component::Delete { text: deleted } => {
                if text::ends_line(deleted) {
                    if on_line {
                        return Position::new(walk.out_line, walk.out_column);
                    }
                    // The next source line joins the current result line
                    walk.line += 1;
                    walk.column = 0;
                } else {
                    let end = walk.column + text::len(deleted);
                    if on_line && position.column < end {
                        return Position::new(walk.out_line, walk.out_column);
                    }
                    walk.column = end;
                }
            }
        }
    }

    if walk.line == position.line {
        walk.on_current_line(position)
    } else {
        Position::new(
            walk.out_line + position.line.saturating_sub(walk.line),
            position.column,
        )
    }
}
