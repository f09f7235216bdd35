//! Editor-level text changes and their operation form

use crate::error::Result;
use crate::ot::{text, DocOp, DocOpBuilder, DocumentLines};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextChangeKind {
    Insert,
    Delete,
}

/// A single insertion or deletion made at a point of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub kind: TextChangeKind,
    /// Line the change starts on
    pub line_number: usize,
    /// Column the change starts at, in UTF-16 code units
    pub column: usize,
    /// Inserted or removed text
    pub text: String,
}

impl TextChange {
    pub fn insertion(line_number: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            kind: TextChangeKind::Insert,
            line_number,
            column,
            text: text.into(),
        }
    }

    pub fn deletion(line_number: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            kind: TextChangeKind::Delete,
            line_number,
            column,
            text: text.into(),
        }
    }

    pub fn is_insert(&self) -> bool {
        self.kind == TextChangeKind::Insert
    }

    /// Operation performing this change
    ///
    /// `document` must be the document as it is after the change. The
    /// operation covers the whole document: a retain for the rest of the last
    /// touched line and a retain-line for every line after it, including an
    /// empty last line.
    pub fn to_doc_op<D: DocumentLines + ?Sized>(&self, document: &D) -> DocOp {
        let mut builder = DocOpBuilder::verbatim();
        builder
            .retain_line(self.line_number)
            .retain(self.column, false);

        let pieces: Vec<&str> = self.text.split('\n').collect();
        let newlines = pieces.len() - 1;
        let last_piece = pieces[newlines];

        match self.kind {
            TextChangeKind::Insert => builder.insert(&self.text),
            TextChangeKind::Delete => builder.delete(&self.text),
        };

        let line_len = |line| {
            document
                .line_text(line)
                .map(|line_text| text::len(&line_text))
                .unwrap_or(0)
        };

        let remaining_count = match self.kind {
            TextChangeKind::Insert => {
                let rest = line_len(self.line_number + newlines)
                    .saturating_sub(text::len(last_piece));
                if newlines == 0 {
                    rest.saturating_sub(self.column)
                } else {
                    rest
                }
            }
            TextChangeKind::Delete => line_len(self.line_number).saturating_sub(self.column),
        };

        let touched_lines = match self.kind {
            TextChangeKind::Insert => self.line_number + newlines + 1,
            TextChangeKind::Delete => self.line_number + 1,
        };
        let remaining_lines = document.line_count().saturating_sub(touched_lines);

        builder.retain(remaining_count, remaining_lines > 0);

        if remaining_lines > 0 {
            builder.retain_line(remaining_lines);
        } else {
            let last_line_empty = document
                .line_text(document.line_count().saturating_sub(1))
                .map_or(true, |last| last.is_empty());
            // A deleted trailing newline had an empty line after it
            let deleted_last_newline = self.kind == TextChangeKind::Delete
                && remaining_count == 0
                && self.text.ends_with('\n');
            if last_line_empty || deleted_last_newline {
                builder.retain_line(1);
            }
        }

        builder.build()
    }
}

/// Single operation performing `changes` in order
///
/// Each change is paired with the document as it was right after that
/// change. Returns `None` when there are no changes.
pub fn doc_op_from_changes<'a, D, I>(changes: I) -> Result<Option<DocOp>>
where
    D: DocumentLines + 'a,
    I: IntoIterator<Item = (&'a TextChange, &'a D)>,
{
    let mut result: Option<DocOp> = None;
    for (change, after) in changes {
        let op = change.to_doc_op(after);
        result = Some(match result {
            Some(previous) => previous.compose(&op)?,
            None => op,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;
    use crate::document::TextDocument;

    fn sample() -> TextDocument {
        TextDocument::from_text("Hello world\nFoo bar\nSomething else\n")
    }

    #[test]
    fn test_single_line_changes() {
        let doc = sample();

        let op = TextChange::insertion(0, 1, "ello").to_doc_op(&doc);
        assert_eq!(op, doc_op![r(1), i("ello"), eol(7), rl(3)]);

        let op = TextChange::deletion(0, 2, "WOOT").to_doc_op(&doc);
        assert_eq!(op, doc_op![r(2), d("WOOT"), eol(10), rl(3)]);
    }

    #[test]
    fn test_multiline_changes() {
        let doc = sample();

        let op = TextChange::insertion(0, 0, "Hello world\n").to_doc_op(&doc);
        assert_eq!(op, doc_op![i("Hello world\n"), eol(8), rl(2)]);

        let op = TextChange::insertion(1, 1, "oo\nSomething ").to_doc_op(&doc);
        assert_eq!(
            op,
            doc_op![rl(1), r(1), i("oo\n"), i("Something "), eol(5), rl(1)]
        );

        let op = TextChange::insertion(0, 5, " world\nFoo bar\n").to_doc_op(&doc);
        assert_eq!(
            op,
            doc_op![r(5), i(" world\n"), i("Foo bar\n"), eol(15), rl(1)]
        );

        let op = TextChange::deletion(0, 3, "Imagine this was a line\n").to_doc_op(&doc);
        assert_eq!(op, doc_op![r(3), d("Imagine this was a line\n"), eol(9), rl(3)]);

        let op = TextChange::deletion(1, 3, "A line\nand some ").to_doc_op(&doc);
        assert_eq!(
            op,
            doc_op![rl(1), r(3), d("A line\n"), d("and some "), eol(5), rl(2)]
        );
    }

    #[test]
    fn test_non_empty_last_line_is_retained() {
        let doc = TextDocument::from_text("Hello world\nFoo bar\nSomething else\nAr");

        let op = TextChange::insertion(3, 0, "A").to_doc_op(&doc);
        assert_eq!(op, doc_op![rl(3), i("A"), r(1)]);

        let op = TextChange::insertion(2, 0, "S").to_doc_op(&doc);
        assert_eq!(op, doc_op![rl(2), i("S"), eol(14), rl(1)]);
    }

    #[test]
    fn test_empty_last_line_is_retained() {
        let doc = TextDocument::from_text("\nThis is\na test\n");
        let op = TextChange::insertion(0, 0, "\n").to_doc_op(&doc);
        assert_eq!(op, doc_op![i("\n"), eol(8), rl(2)]);

        let doc = TextDocument::from_text("");
        assert_eq!(TextChange::insertion(0, 0, "").to_doc_op(&doc), doc_op![rl(1)]);
        assert_eq!(
            TextChange::deletion(0, 0, "a").to_doc_op(&doc),
            doc_op![d("a"), rl(1)]
        );

        let doc = TextDocument::from_text("alex\n");
        let op = TextChange::insertion(0, 4, "\n").to_doc_op(&doc);
        assert_eq!(op, doc_op![r(4), i("\n"), rl(1)]);
    }

    #[test]
    fn test_deleting_last_newline() {
        // "ab\n" became "ab"
        let doc = TextDocument::from_text("ab");
        let op = TextChange::deletion(0, 2, "\n").to_doc_op(&doc);
        assert_eq!(op, doc_op![r(2), d("\n"), rl(1)]);
    }

    #[test]
    fn test_changes_compose() {
        let mut doc = TextDocument::from_text("abc\n");
        let original = doc.clone();

        let first = doc.insert(0, 1, "XY").unwrap();
        let after_first = doc.clone();
        let second = doc.delete(0, 0, 2).unwrap();

        let op = doc_op_from_changes([(&first, &after_first), (&second, &doc)])
            .unwrap()
            .unwrap();

        let mut replay = original;
        replay.apply(&op).unwrap();
        assert_eq!(replay.text(), "Ybc\n");
        assert_eq!(replay, doc);
    }

    #[test]
    fn test_no_changes() {
        let empty: Vec<(&TextChange, &TextDocument)> = Vec::new();
        assert_eq!(doc_op_from_changes(empty).unwrap(), None);
    }
}
