//! Applying operations to a concrete document
//!
//! The applier is the only part of the engine that touches a real text
//! buffer. It walks an operation while tracking the current line and column
//! and issues exactly one mutator call per `Insert` or `Delete` component.
//! Retains only move the cursor.
//!
//! Before each call the applier checks the operation against the document:
//! deleted text must be present at the cursor and retains must stay inside
//! the line they start on.

use super::component::Component;
use super::doc_op::DocOp;
use super::text;
use crate::error::{OpError, Result};

/// Edits a line-oriented document
pub trait DocumentMutator {
    /// Insert `text` at `column` of line `line_number`
    fn insert_text(&mut self, line_number: usize, column: usize, text: &str) -> Result<()>;

    /// Delete `count` code units starting at `column` of line `line_number`
    fn delete_text(&mut self, line_number: usize, column: usize, count: usize) -> Result<()>;
}

/// Read access to the lines of a document
///
/// A document always has at least one line. Every line but the last ends
/// with `\n`; the last line does not, and is empty when the text ends with
/// a newline.
pub trait DocumentLines {
    fn line_count(&self) -> usize;

    /// Text of a line, including its terminating newline
    fn line_text(&self, line_number: usize) -> Option<String>;
}

/// Apply `op` to `document`
pub fn apply<D>(op: &DocOp, document: &mut D) -> Result<()>
where
    D: DocumentMutator + DocumentLines,
{
    op.validate()?;

    let mut line = 0;
    let mut column = 0;
    let mut finished = false;

    for component in op {
        if finished {
            return Err(OpError::Apply(format!(
                "{} after the end of the document",
                component
            )));
        }

        match component {
            Component::Retain {
                count,
                ends_with_newline,
            } => {
                let line_text = line_text(document, line)?;
                let line_len = text::len(&line_text);
                let end = column + count;
                if *ends_with_newline {
                    if end != line_len || !text::ends_line(&line_text) {
                        return Err(OpError::Apply(format!(
                            "{} at {}:{} does not end at the end of the line",
                            component, line, column
                        )));
                    }
                    line += 1;
                    column = 0;
                } else {
                    let content_len = line_len - usize::from(text::ends_line(&line_text));
                    if end > content_len {
                        return Err(OpError::Apply(format!(
                            "{} at {}:{} runs past the end of the line",
                            component, line, column
                        )));
                    }
                    column = end;
                }
            }
            Component::RetainLine { line_count } => {
                let target = line + line_count;
                let available = document.line_count();
                if target < available {
                    line = target;
                    column = 0;
                } else if target == available {
                    finished = true;
                } else {
                    return Err(OpError::Apply(format!(
                        "{} at line {} retains past the last line {}",
                        component,
                        line,
                        available - 1
                    )));
                }
            }
            Component::Insert { text: inserted } => {
                document.insert_text(line, column, inserted)?;
                if text::ends_line(inserted) {
                    line += 1;
                    column = 0;
                } else {
                    column += text::len(inserted);
                }
            }
            Component::Delete { text: deleted } => {
                let line_text = line_text(document, line)?;
                let present = text::split_at(&line_text, column)
                    .map(|(_, rest)| rest.starts_with(deleted.as_str()))
                    .unwrap_or(false);
                if !present {
                    return Err(OpError::Apply(format!(
                        "{} at {}:{} does not match {:?}",
                        component, line, column, line_text
                    )));
                }
                document.delete_text(line, column, text::len(deleted))?;
            }
        }

        tracing::trace!(component = %component, line, column, "applied component");
    }

    Ok(())
}

fn line_text<D: DocumentLines>(document: &D, line: usize) -> Result<String> {
    document
        .line_text(line)
        .ok_or(OpError::Position { line, column: 0 })
}
