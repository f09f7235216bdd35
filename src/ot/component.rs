//! Operation components
//!
//! A component is one step of the walk an operation takes over a document.
//! Components never span more than one line: an insert or delete contains at
//! most one `\n`, and only as its last character. A retain that covers a
//! newline says so with `ends_with_newline`.

use super::text;
use crate::error::{OpError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a document operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    /// Skip `count` code units of the current line
    Retain {
        count: usize,
        #[serde(rename = "endsWithNewline")]
        ends_with_newline: bool,
    },

    /// Skip the remainder of the current line and `line_count - 1` more lines
    RetainLine {
        #[serde(rename = "lineCount")]
        line_count: usize,
    },

    /// Insert literal text at the cursor
    Insert { text: String },

    /// Delete literal text at the cursor
    Delete { text: String },
}

impl Component {
    pub fn retain(count: usize, ends_with_newline: bool) -> Self {
        Component::Retain {
            count,
            ends_with_newline,
        }
    }

    pub fn retain_line(line_count: usize) -> Self {
        Component::RetainLine { line_count }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Component::Insert { text: text.into() }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Component::Delete { text: text.into() }
    }

    /// Whether this component changes the document
    pub fn is_mutation(&self) -> bool {
        matches!(self, Component::Insert { .. } | Component::Delete { .. })
    }

    /// Whether the document walk moves to a new line after this component
    pub fn ends_line(&self) -> bool {
        match self {
            Component::Retain {
                ends_with_newline, ..
            } => *ends_with_newline,
            Component::RetainLine { .. } => true,
            Component::Insert { text } | Component::Delete { text } => text::ends_line(text),
        }
    }

    /// Check the component invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            Component::Retain { count: 0, .. } => {
                Err(OpError::Malformed("retain of zero code units".to_string()))
            }
            Component::RetainLine { line_count: 0 } => {
                Err(OpError::Malformed("retain of zero lines".to_string()))
            }
            Component::Insert { text } | Component::Delete { text } => {
                if text.is_empty() {
                    return Err(OpError::Malformed(format!("empty {}", self.kind())));
                }
                match text.find('\n') {
                    Some(idx) if idx + 1 != text.len() => Err(OpError::Malformed(format!(
                        "{} {:?} spans more than one line",
                        self.kind(),
                        text
                    ))),
                    _ => Ok(()),
                }
            }
            Component::Retain { .. } | Component::RetainLine { .. } => Ok(()),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Component::Retain { .. } => "retain",
            Component::RetainLine { .. } => "retainLine",
            Component::Insert { .. } => "insert",
            Component::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Retain {
                count,
                ends_with_newline: false,
            } => write!(f, "R({})", count),
            Component::Retain {
                count,
                ends_with_newline: true,
            } => write!(f, "R({}\\n)", count),
            Component::RetainLine { line_count } => write!(f, "RL({})", line_count),
            Component::Insert { text } => write!(f, "I({:?})", text),
            Component::Delete { text } => write!(f, "D({:?})", text),
        }
    }
}
