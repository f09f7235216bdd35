//! Operation builder
//!
//! Every operation produced by this crate goes through a [`DocOpBuilder`].
//! The builder splits multi-line text into one component per line and drops
//! zero-length components. A coalescing builder additionally merges adjacent
//! components of the same kind and rewrites a line made only of retains as a
//! single `RetainLine`.
//!
//! # Example
//!
//! ```
//! use synckit_ot::{Component, DocOpBuilder};
//!
//! let op = DocOpBuilder::coalescing()
//!     .retain(2, false)
//!     .retain(3, true)
//!     .insert("ab")
//!     .insert("c\nd")
//!     .build();
//!
//! assert_eq!(
//!     op.components(),
//!     &[
//!         Component::retain_line(1),
//!         Component::insert("abc\n"),
//!         Component::insert("d"),
//!     ]
//! );
//! ```

use super::component::Component;
use super::doc_op::DocOp;
use super::text;
use std::mem;

/// Append-only accumulator of components
#[derive(Debug, Clone)]
pub struct DocOpBuilder {
    components: Vec<Component>,
    pending: Option<Component>,
    coalesce: bool,
    /// The line being built has seen an insert or delete
    line_has_mutation: bool,
}

impl DocOpBuilder {
    /// Builder that merges adjacent components
    pub fn coalescing() -> Self {
        Self::with_coalescing(true)
    }

    /// Builder that keeps every appended component as given
    pub fn verbatim() -> Self {
        Self::with_coalescing(false)
    }

    pub fn with_coalescing(coalesce: bool) -> Self {
        Self {
            components: Vec::new(),
            pending: None,
            coalesce,
            line_has_mutation: false,
        }
    }

    pub fn is_coalescing(&self) -> bool {
        self.coalesce
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.pending.is_none()
    }

    pub fn retain(&mut self, count: usize, ends_with_newline: bool) -> &mut Self {
        if count > 0 {
            self.append(Component::retain(count, ends_with_newline));
        }
        self
    }

    pub fn retain_line(&mut self, line_count: usize) -> &mut Self {
        if line_count > 0 {
            self.append(Component::retain_line(line_count));
        }
        self
    }

    /// Insert `text`, one component per line
    pub fn insert(&mut self, text: &str) -> &mut Self {
        for piece in text.split_inclusive('\n') {
            self.append(Component::insert(piece));
        }
        self
    }

    /// Delete `text`, one component per line
    pub fn delete(&mut self, text: &str) -> &mut Self {
        for piece in text.split_inclusive('\n') {
            self.append(Component::delete(piece));
        }
        self
    }

    /// Append a component of any kind
    pub fn push(&mut self, component: &Component) -> &mut Self {
        match component {
            Component::Retain {
                count,
                ends_with_newline,
            } => self.retain(*count, *ends_with_newline),
            Component::RetainLine { line_count } => self.retain_line(*line_count),
            Component::Insert { text } => self.insert(text),
            Component::Delete { text } => self.delete(text),
        }
    }

    /// Take the accumulated operation, leaving the builder empty
    pub fn build(&mut self) -> DocOp {
        self.flush();
        self.line_has_mutation = false;
        DocOp::from_built(mem::take(&mut self.components))
    }

    fn append(&mut self, next: Component) {
        if let Component::Retain {
            ends_with_newline: true,
            ..
        } = next
        {
            if self.coalesce && !self.line_has_mutation {
                if let Some(Component::Retain {
                    ends_with_newline: false,
                    ..
                }) = self.pending
                {
                    self.pending = None;
                }
                self.append(Component::retain_line(1));
                return;
            }
        }

        if !self.extends_pending(&next) {
            self.flush();
        }

        match &next {
            Component::Insert { text } | Component::Delete { text } => {
                self.line_has_mutation = !text::ends_line(text);
            }
            Component::Retain {
                ends_with_newline: true,
                ..
            }
            | Component::RetainLine { .. } => self.line_has_mutation = false,
            Component::Retain { .. } => {}
        }

        match (&mut self.pending, next) {
            (
                Some(Component::Retain {
                    count,
                    ends_with_newline,
                }),
                Component::Retain {
                    count: more,
                    ends_with_newline: eol,
                },
            ) => {
                *count += more;
                *ends_with_newline = eol;
            }
            (
                Some(Component::RetainLine { line_count }),
                Component::RetainLine { line_count: more },
            ) => *line_count += more,
            (Some(Component::Insert { text }), Component::Insert { text: more })
            | (Some(Component::Delete { text }), Component::Delete { text: more }) => {
                text.push_str(&more)
            }
            (slot, next) => *slot = Some(next),
        }
    }

    fn extends_pending(&self, next: &Component) -> bool {
        if !self.coalesce {
            return false;
        }
        match &self.pending {
            Some(Component::RetainLine { .. }) => matches!(next, Component::RetainLine { .. }),
            Some(current) => {
                mem::discriminant(current) == mem::discriminant(next) && !current.ends_line()
            }
            None => false,
        }
    }

    fn flush(&mut self) {
        if let Some(component) = self.pending.take() {
            self.components.push(component);
        }
    }
}

impl Default for DocOpBuilder {
    fn default() -> Self {
        Self::coalescing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;

    #[test]
    fn test_verbatim_keeps_components() {
        let op = DocOpBuilder::verbatim()
            .retain(1, false)
            .retain(2, true)
            .insert("a")
            .insert("b")
            .build();

        assert_eq!(
            op.components(),
            &[
                Component::retain(1, false),
                Component::retain(2, true),
                Component::insert("a"),
                Component::insert("b"),
            ]
        );
    }

    #[test]
    fn test_text_is_split_per_line() {
        let op = DocOpBuilder::verbatim().insert("ab\n\ncd").build();
        assert_eq!(op, doc_op![i("ab\n"), i("\n"), i("cd")]);

        let op = DocOpBuilder::coalescing().delete("x\ny\n").build();
        assert_eq!(op, doc_op![d("x\n"), d("y\n")]);
    }

    #[test]
    fn test_zero_length_components_are_dropped() {
        let op = DocOpBuilder::verbatim()
            .retain(0, false)
            .retain_line(0)
            .insert("")
            .delete("")
            .build();
        assert!(op.is_empty());
    }

    #[test]
    fn test_coalesces_same_kind() {
        let op = DocOpBuilder::coalescing()
            .delete("hello")
            .delete("world")
            .insert("foo")
            .insert("bar")
            .build();
        assert_eq!(op, doc_op![d("helloworld"), i("foobar")]);
    }

    #[test]
    fn test_does_not_coalesce_across_line_end() {
        let op = DocOpBuilder::coalescing()
            .insert("a\n")
            .insert("b")
            .delete("c\n")
            .delete("d")
            .build();
        assert_eq!(op, doc_op![i("a\n"), i("b"), d("c\n"), d("d")]);
    }

    #[test]
    fn test_retain_only_line_becomes_retain_line() {
        let op = DocOpBuilder::coalescing()
            .retain(3, false)
            .retain(4, true)
            .retain(5, true)
            .retain_line(2)
            .build();
        assert_eq!(op, doc_op![rl(4)]);
    }

    #[test]
    fn test_retain_after_mutation_keeps_newline_retain() {
        let op = DocOpBuilder::coalescing()
            .retain(1, false)
            .insert("x")
            .retain(2, false)
            .retain(3, true)
            .retain(4, true)
            .build();
        assert_eq!(op, doc_op![r(1), i("x"), eol(5), rl(1)]);
    }

    #[test]
    fn test_build_resets_builder() {
        let mut builder = DocOpBuilder::coalescing();
        builder.insert("a");
        let first = builder.build();
        assert!(builder.is_empty());

        builder.retain(1, true);
        let second = builder.build();

        assert_eq!(first, doc_op![i("a")]);
        assert_eq!(second, doc_op![rl(1)]);
    }
}
