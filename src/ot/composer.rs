//! Composition of sequential operations
//!
//! `compose(a, b)` produces a single operation with the effect of applying
//! `a` and then `b`. The composer walks both operations at once: components
//! of `a` are read until one of them is outstanding, then components of `b`
//! are read against it, and so on. The current [`State`] names the
//! outstanding component and which operation is being read.
//!
//! A trailing `RetainLine(1)` that matches the empty last line of a document
//! is tolerated on either side even when the other operation has no line left
//! to match it. It is kept in the result when `a` deleted a line end after
//! the last component of `b`, since it then still covers a line of the
//! document `a` was made on.
//!
//! A delete followed by an insert of the same text is kept as both
//! components rather than folded into a retain.
//!
//! # Example
//!
//! ```
//! use synckit_ot::doc_op;
//!
//! let typed_h = doc_op![i("h")];
//! let typed_i = doc_op![r(1), i("i")];
//!
//! assert_eq!(typed_h.compose(&typed_i).unwrap(), doc_op![i("hi")]);
//! ```

use super::builder::DocOpBuilder;
use super::component::Component;
use super::doc_op::DocOp;
use super::text;
use crate::error::{OpError, Result};

type Step = std::result::Result<(), String>;

/// Compose `a` followed by `b` into one operation
pub fn compose(a: &DocOp, b: &DocOp) -> Result<DocOp> {
    a.validate()?;
    b.validate()?;

    Composer::new(b.is_empty()).run(a, b).map_err(|reason| {
        tracing::debug!(reason = %reason, a = %a, b = %b, "compose rejected");
        OpError::Compose {
            reason,
            a: a.to_string(),
            b: b.to_string(),
        }
    })
}

/// Compose a sequence of operations, oldest first
///
/// Returns `None` for an empty sequence.
pub fn compose_all<'a, I>(ops: I) -> Result<Option<DocOp>>
where
    I: IntoIterator<Item = &'a DocOp>,
{
    let mut ops = ops.into_iter();
    let Some(first) = ops.next() else {
        return Ok(None);
    };

    let mut composed = first.clone();
    for op in ops {
        composed = compose(&composed, op)?;
    }
    Ok(Some(composed))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Nothing outstanding, read from `a`
    Idle,

    // Outstanding component of `b`, read from `a`
    BDelete(String),
    BRetain { count: usize, eol: bool },
    BRetainLine(usize),

    // Outstanding component of `a`, read from `b`
    AInsert(String),
    ARetain { count: usize, eol: bool },
    ARetainLine(usize),
    /// `a` is exhausted; `b` may only insert, plus one `RetainLine(1)` for
    /// the empty last line
    AFinished { matched_last_line: bool },
}

impl State {
    fn reads_b(&self) -> bool {
        matches!(
            self,
            State::AInsert(_)
                | State::ARetain { .. }
                | State::ARetainLine(_)
                | State::AFinished { .. }
        )
    }
}

struct Composer {
    output: DocOpBuilder,
    state: State,
    last_of_a: bool,
    last_of_b: bool,
    /// `a` deleted a line end after the latest component of `b` was read
    a_ended_line: bool,
}

impl Composer {
    fn new(b_is_empty: bool) -> Self {
        Self {
            output: DocOpBuilder::coalescing(),
            state: State::Idle,
            last_of_a: false,
            last_of_b: b_is_empty,
            a_ended_line: false,
        }
    }

    fn run(mut self, a: &DocOp, b: &DocOp) -> std::result::Result<DocOp, String> {
        let b = b.components();
        let mut b_index = 0;

        let a = a.components();
        for (a_index, component) in a.iter().enumerate() {
            self.last_of_a = a_index + 1 == a.len();
            self.feed_a(component)?;

            while self.state.reads_b() && !matches!(self.state, State::AFinished { .. }) {
                let component = b.get(b_index).ok_or_else(|| {
                    "the second operation ends before the first one does".to_string()
                })?;
                self.last_of_b = b_index + 1 == b.len();
                b_index += 1;
                self.feed_b(component)?;
            }
        }

        let settled = match self.state {
            State::Idle | State::AFinished { .. } => true,
            State::BRetainLine(1) => self.last_of_a && self.last_of_b,
            _ => false,
        };
        if !settled {
            return Err(format!(
                "the operations do not cover the same document (left in {:?})",
                self.state
            ));
        }

        if b_index < b.len() {
            if self.state == State::Idle {
                self.state = State::AFinished {
                    matched_last_line: false,
                };
            }
            for (offset, component) in b[b_index..].iter().enumerate() {
                self.last_of_b = b_index + offset + 1 == b.len();
                self.feed_b(component)?;
            }
        }

        Ok(self.output.build())
    }

    /// Read a component of `a` against the outstanding component of `b`
    fn feed_a(&mut self, component: &Component) -> Step {
        let state = std::mem::replace(&mut self.state, State::Idle);
        if state.reads_b() {
            return Err(format!("read a component of the first operation in {:?}", state));
        }

        self.state = match (state, component) {
            (state, Component::Delete { text }) => {
                self.output.delete(text);
                if state == State::Idle && text::ends_line(text) {
                    self.a_ended_line = true;
                }
                state
            }

            (State::Idle, Component::Insert { text }) => State::AInsert(text.clone()),
            (State::Idle, Component::Retain { count, ends_with_newline }) => State::ARetain {
                count: *count,
                eol: *ends_with_newline,
            },
            (State::Idle, Component::RetainLine { line_count }) => {
                if self.last_of_b && *line_count == 1 && self.last_of_a {
                    // Still the only cover of the empty last line once `a`
                    // has joined lines past the end of `b`
                    if self.a_ended_line {
                        self.output.retain_line(1);
                    }
                    State::Idle
                } else {
                    State::ARetainLine(*line_count)
                }
            }

            (State::BDelete(deleted), Component::Insert { text: inserted }) => {
                let (deleted_len, inserted_len) = (text::len(&deleted), text::len(inserted));
                if inserted_len <= deleted_len {
                    let rest = cancel_text(inserted, &deleted)?;
                    if rest.is_empty() {
                        State::Idle
                    } else {
                        State::BDelete(rest)
                    }
                } else {
                    State::AInsert(cancel_text(&deleted, inserted)?)
                }
            }
            (State::BDelete(deleted), Component::Retain { count, ends_with_newline }) => {
                let deleted_len = text::len(&deleted);
                if *count <= deleted_len {
                    let (head, rest) = split(&deleted, *count)?;
                    self.output.delete(head);
                    if rest.is_empty() {
                        State::Idle
                    } else {
                        State::BDelete(rest.to_string())
                    }
                } else {
                    self.output.delete(&deleted);
                    State::ARetain {
                        count: count - deleted_len,
                        eol: *ends_with_newline,
                    }
                }
            }
            (State::BDelete(deleted), Component::RetainLine { line_count }) => {
                self.output.delete(&deleted);
                let line_ended = text::ends_line(&deleted) || self.last_of_b;
                self.after_b_consumed_a_line(*line_count, line_ended)
            }

            (State::BRetain { count, eol }, Component::Insert { text: inserted }) => {
                let inserted_len = text::len(inserted);
                if inserted_len <= count {
                    self.output.insert(inserted);
                    if inserted_len == count {
                        State::Idle
                    } else {
                        State::BRetain {
                            count: count - inserted_len,
                            eol,
                        }
                    }
                } else {
                    let (head, rest) = split(inserted, count)?;
                    self.output.insert(head);
                    State::AInsert(rest.to_string())
                }
            }
            (State::BRetain { count, eol }, Component::Retain { count: a_count, ends_with_newline }) => {
                if *a_count <= count {
                    self.output.retain(*a_count, *ends_with_newline);
                    if *a_count == count {
                        State::Idle
                    } else {
                        State::BRetain {
                            count: count - a_count,
                            eol,
                        }
                    }
                } else {
                    self.output.retain(count, eol);
                    State::ARetain {
                        count: a_count - count,
                        eol: *ends_with_newline,
                    }
                }
            }
            (State::BRetain { count, eol }, Component::RetainLine { line_count }) => {
                self.output.retain(count, eol);
                let line_ended = eol || self.last_of_b;
                self.after_b_consumed_a_line(*line_count, line_ended)
            }

            (State::BRetainLine(lines), Component::Insert { text: inserted }) => {
                self.output.insert(inserted);
                let newline = text::ends_line(inserted);
                if newline || self.last_of_a {
                    self.cancel_b_lines(lines, 1, newline)
                } else {
                    State::BRetainLine(lines)
                }
            }
            (State::BRetainLine(lines), Component::Retain { count, ends_with_newline }) => {
                self.output.retain(*count, *ends_with_newline);
                if *ends_with_newline || self.last_of_a {
                    self.cancel_b_lines(lines, 1, *ends_with_newline)
                } else {
                    State::BRetainLine(lines)
                }
            }
            (State::BRetainLine(lines), Component::RetainLine { line_count }) => {
                let common = lines.min(*line_count);
                self.output.retain_line(common);
                if lines == *line_count {
                    State::Idle
                } else if *line_count == common {
                    self.cancel_b_lines(lines, common, true)
                } else {
                    State::ARetainLine(line_count - common)
                }
            }

            (state, component) => {
                return Err(format!("cannot read {} in {:?}", component, state));
            }
        };
        Ok(())
    }

    /// Read a component of `b` against the outstanding component of `a`
    fn feed_b(&mut self, component: &Component) -> Step {
        self.a_ended_line = false;
        let state = std::mem::replace(&mut self.state, State::Idle);
        if !state.reads_b() {
            return Err(format!("read a component of the second operation in {:?}", state));
        }

        self.state = match (state, component) {
            (State::ARetainLine(lines), Component::Insert { text }) => {
                self.output.insert(text);
                if self.last_of_b {
                    cancel_a_lines(lines, 1)
                } else {
                    State::ARetainLine(lines)
                }
            }
            (state, Component::Insert { text }) => {
                self.output.insert(text);
                state
            }

            (State::AFinished { .. }, Component::Delete { .. } | Component::Retain { .. }) => {
                return Err(format!(
                    "the first operation is exhausted, the second cannot {}",
                    component.kind()
                ));
            }
            (State::AFinished { matched_last_line }, Component::RetainLine { line_count }) => {
                if *line_count == 1 && !matched_last_line {
                    self.output.retain_line(1);
                    State::AFinished {
                        matched_last_line: true,
                    }
                } else {
                    return Err(format!(
                        "the first operation is exhausted, the second cannot retain {} more line(s)",
                        line_count
                    ));
                }
            }

            (State::AInsert(inserted), Component::Delete { text: deleted }) => {
                let (inserted_len, deleted_len) = (text::len(&inserted), text::len(deleted));
                if deleted_len <= inserted_len {
                    let rest = cancel_text(deleted, &inserted)?;
                    if rest.is_empty() {
                        State::Idle
                    } else {
                        State::AInsert(rest)
                    }
                } else {
                    State::BDelete(cancel_text(&inserted, deleted)?)
                }
            }
            (State::AInsert(inserted), Component::Retain { count, ends_with_newline }) => {
                let inserted_len = text::len(&inserted);
                if *count <= inserted_len {
                    let (head, rest) = split(&inserted, *count)?;
                    self.output.insert(head);
                    if rest.is_empty() {
                        State::Idle
                    } else {
                        State::AInsert(rest.to_string())
                    }
                } else {
                    self.output.insert(&inserted);
                    State::BRetain {
                        count: count - inserted_len,
                        eol: *ends_with_newline,
                    }
                }
            }
            (State::AInsert(inserted), Component::RetainLine { line_count }) => {
                self.output.insert(&inserted);
                let remaining = if text::ends_line(&inserted) {
                    line_count - 1
                } else {
                    *line_count
                };
                self.after_a_consumed_b_line(remaining)
            }

            (State::ARetain { count, eol }, Component::Delete { text: deleted }) => {
                let deleted_len = text::len(deleted);
                if deleted_len <= count {
                    self.output.delete(deleted);
                    if deleted_len == count {
                        State::Idle
                    } else {
                        State::ARetain {
                            count: count - deleted_len,
                            eol,
                        }
                    }
                } else {
                    let (head, rest) = split(deleted, count)?;
                    self.output.delete(head);
                    State::BDelete(rest.to_string())
                }
            }
            (State::ARetain { count, eol }, Component::Retain { count: b_count, ends_with_newline }) => {
                if *b_count <= count {
                    self.output.retain(*b_count, *ends_with_newline);
                    if *b_count == count {
                        State::Idle
                    } else {
                        State::ARetain {
                            count: count - b_count,
                            eol,
                        }
                    }
                } else {
                    self.output.retain(count, eol);
                    State::BRetain {
                        count: b_count - count,
                        eol: *ends_with_newline,
                    }
                }
            }
            (State::ARetain { count, eol }, Component::RetainLine { line_count }) => {
                self.output.retain(count, eol);
                let remaining = if eol { line_count - 1 } else { *line_count };
                self.after_a_consumed_b_line(remaining)
            }

            (State::ARetainLine(lines), Component::Delete { text }) => {
                self.output.delete(text);
                if text::ends_line(text) || self.last_of_b {
                    cancel_a_lines(lines, 1)
                } else {
                    State::ARetainLine(lines)
                }
            }
            (State::ARetainLine(lines), Component::Retain { count, ends_with_newline }) => {
                self.output.retain(*count, *ends_with_newline);
                if *ends_with_newline || self.last_of_b {
                    cancel_a_lines(lines, 1)
                } else {
                    State::ARetainLine(lines)
                }
            }
            (State::ARetainLine(lines), Component::RetainLine { line_count }) => {
                let common = lines.min(*line_count);
                self.output.retain_line(common);
                if lines == *line_count {
                    State::Idle
                } else if *line_count == common {
                    cancel_a_lines(lines, common)
                } else {
                    State::BRetainLine(line_count - common)
                }
            }

            (state, component) => {
                return Err(format!("cannot read {} in {:?}", component, state));
            }
        };
        Ok(())
    }

    /// `b` finished a line that an outstanding `RetainLine` of `a` covers
    fn after_b_consumed_a_line(&self, a_lines: usize, line_ended: bool) -> State {
        match (line_ended, a_lines) {
            (true, 1) => State::Idle,
            (true, lines) => State::ARetainLine(lines - 1),
            (false, lines) => State::ARetainLine(lines),
        }
    }

    /// `a` finished a line that an outstanding `RetainLine` of `b` covers
    fn after_a_consumed_b_line(&self, b_lines: usize) -> State {
        if self.last_of_a {
            self.after_last_of_a(b_lines)
        } else if b_lines == 0 {
            State::Idle
        } else {
            State::BRetainLine(b_lines)
        }
    }

    fn cancel_b_lines(&self, b_lines: usize, consumed: usize, line_ended: bool) -> State {
        let b_lines = if line_ended { b_lines - consumed } else { b_lines };
        if self.last_of_a {
            self.after_last_of_a(b_lines)
        } else if b_lines == 0 {
            State::Idle
        } else {
            State::BRetainLine(b_lines)
        }
    }

    /// `a` is exhausted while `b` still retains `b_lines` lines
    fn after_last_of_a(&self, b_lines: usize) -> State {
        match b_lines {
            0 => State::AFinished {
                matched_last_line: false,
            },
            1 => State::AFinished {
                matched_last_line: true,
            },
            lines => State::BRetainLine(lines),
        }
    }
}

fn cancel_a_lines(a_lines: usize, consumed: usize) -> State {
    if a_lines == consumed {
        State::Idle
    } else {
        State::ARetainLine(a_lines - consumed)
    }
}

fn split(text: &str, units: usize) -> std::result::Result<(&str, &str), String> {
    text::split_at(text, units)
        .ok_or_else(|| format!("cannot split {:?} after {} code units", text, units))
}

/// Cancel `shorter` against the start of `longer`, returning what is left of `longer`
///
/// An insert followed by a delete of the same text cancels out; anything else
/// means the two operations disagree about the document.
fn cancel_text(shorter: &str, longer: &str) -> std::result::Result<String, String> {
    match longer.strip_prefix(shorter) {
        Some(rest) => Ok(rest.to_string()),
        None => Err(format!(
            "deleted text does not match inserted text: {:?} vs {:?}",
            shorter, longer
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;

    fn assert_compose(a: DocOp, b: DocOp, expected: DocOp) {
        assert_eq!(compose(&a, &b).unwrap(), expected, "composing {} with {}", a, b);
    }

    fn assert_compose_fails(a: DocOp, b: DocOp) {
        let result = compose(&a, &b);
        assert!(
            matches!(result, Err(OpError::Compose { .. })),
            "composing {} with {} gave {:?}",
            a,
            b,
            result
        );
    }

    #[test]
    fn test_insert_then_insert() {
        assert_compose(doc_op![i("h")], doc_op![r(1), i("i")], doc_op![i("hi")]);
        assert_compose(doc_op![i("i")], doc_op![i("h"), r(1)], doc_op![i("hi")]);
    }

    #[test]
    fn test_insert_then_delete_cancels() {
        assert_compose(doc_op![i("a")], doc_op![d("a"), rl(1)], doc_op![rl(1)]);
        assert_compose(doc_op![i("h"), r(1)], doc_op![r(1), d("i")], doc_op![i("h"), d("i")]);
        assert_compose(doc_op![r(1), i("a")], doc_op![r(1), d("a"), rl(1)], doc_op![r(1), rl(1)]);
    }

    #[test]
    fn test_delete_then_insert_does_not_cancel() {
        assert_compose(doc_op![d("a"), rl(1)], doc_op![i("a")], doc_op![d("a"), i("a")]);
        assert_compose(doc_op![d("h")], doc_op![i("i")], doc_op![d("h"), i("i")]);
    }

    #[test]
    fn test_delete_then_delete() {
        assert_compose(
            doc_op![d("hello"), d("world")],
            doc_op![],
            doc_op![d("helloworld")],
        );
        assert_compose(
            doc_op![d("hello"), r(5)],
            doc_op![d("world")],
            doc_op![d("helloworld")],
        );
    }

    #[test]
    fn test_retain_and_insert() {
        assert_compose(doc_op![r(1)], doc_op![i("i"), r(1)], doc_op![i("i"), r(1)]);
        assert_compose(doc_op![i("h"), r(1)], doc_op![r(2), i("i")], doc_op![i("h"), r(1), i("i")]);
    }

    #[test]
    fn test_retain_line_of_eol_retain() {
        assert_compose(doc_op![eol(1)], doc_op![rl(2)], doc_op![rl(1)]);
        assert_compose(doc_op![eol(5), rl(1)], doc_op![rl(2)], doc_op![rl(2)]);
    }

    #[test]
    fn test_insert_against_retain_line() {
        assert_compose(doc_op![i("a\n"), rl(1)], doc_op![rl(2)], doc_op![i("a\n"), rl(1)]);
        assert_compose(doc_op![i("\n")], doc_op![rl(2)], doc_op![i("\n")]);
        assert_compose(doc_op![i("a")], doc_op![rl(1)], doc_op![i("a")]);
    }

    #[test]
    fn test_retain_line_can_start_midline() {
        assert_compose(
            doc_op![r(1), i("a"), rl(1)],
            doc_op![r(1), d("a"), rl(1)],
            doc_op![r(1), rl(1)],
        );
    }

    #[test]
    fn test_multiline_composition() {
        // "ab\ncd" -> insert "X\n" after "a" -> delete "cd"
        let a = doc_op![r(1), i("X\n"), eol(2), r(2)];
        let b = doc_op![rl(1), eol(2), d("cd")];
        assert_compose(a, b, doc_op![r(1), i("X\n"), rl(1), d("cd")]);
    }

    #[test]
    fn test_empty_last_line_retain_line_is_lenient() {
        assert_compose(doc_op![rl(1)], doc_op![], doc_op![]);
        assert_compose(doc_op![], doc_op![rl(1)], doc_op![rl(1)]);
        assert_compose(doc_op![i("a")], doc_op![r(1), rl(1)], doc_op![i("a"), rl(1)]);
    }

    #[test]
    fn test_joined_lines_keep_the_empty_last_line() {
        // "aa\n\n": both line ends deleted, then "x" typed at the start
        let a = doc_op![r(2), d("\n"), d("\n"), rl(1)];
        let b = doc_op![i("x"), r(2)];
        let composed = compose(&a, &b).unwrap();
        assert_eq!(composed, doc_op![i("x"), r(2), d("\n"), d("\n"), rl(1)]);

        // Still covers all three lines of the document it was made on
        let typed = compose(&doc_op![rl(3)], &composed).unwrap();
        assert_eq!(typed, composed);
        assert_compose(composed, doc_op![rl(1)], doc_op![i("x"), r(2), d("\n"), d("\n"), rl(1)]);
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        assert_compose_fails(doc_op![i("test")], doc_op![rl(50), rl(1)]);
        assert_compose_fails(doc_op![i("a")], doc_op![rl(2)]);
        assert_compose_fails(doc_op![i("\n")], doc_op![rl(3)]);
        assert_compose_fails(doc_op![r(3)], doc_op![r(2)]);
        assert_compose_fails(doc_op![i("ab")], doc_op![r(3)]);
    }

    #[test]
    fn test_second_operation_cannot_extend_past_first() {
        assert_compose_fails(doc_op![i("a")], doc_op![r(1), d("b")]);
        assert_compose_fails(doc_op![i("a")], doc_op![r(1), r(1)]);
        assert_compose_fails(doc_op![rl(1)], doc_op![rl(3)]);
    }

    #[test]
    fn test_delete_of_inserted_text_must_match() {
        assert_compose_fails(doc_op![i("abc")], doc_op![d("abd")]);
        assert_compose_fails(doc_op![i("ab")], doc_op![d("xy"), d("z")]);
    }

    #[test]
    fn test_malformed_component_is_rejected() {
        let bad = DocOp::from_built(vec![Component::retain(0, false)]);
        assert!(matches!(
            compose(&bad, &doc_op![]),
            Err(OpError::Malformed(_))
        ));
    }

    #[test]
    fn test_compose_all() {
        let ops = [doc_op![i("a")], doc_op![r(1), i("b")], doc_op![r(2), i("c")]];
        assert_eq!(compose_all(&ops).unwrap(), Some(doc_op![i("abc")]));
        assert_eq!(compose_all(&[] as &[DocOp]).unwrap(), None);
    }

    #[test]
    fn test_deletion_across_lines() {
        let a = doc_op![
            rl(1),
            d("a"),
            i("abcde"),
            eol(5),
            d("abcde"),
            i("abcde"),
            eol(5),
            rl(1)
        ];
        let b = doc_op![d("abcde\n"), d("abcdeabcd\n"), d("abcdeabcd\n")];

        assert_compose(
            a,
            b,
            doc_op![d("abcde\n"), d("aabcd\n"), d("abcdeabcd\n")],
        );
    }

    #[test]
    fn test_counts_utf16_code_units() {
        assert_compose(doc_op![i("😀")], doc_op![r(2), i("x")], doc_op![i("😀x")]);
        assert_compose(doc_op![r(3)], doc_op![d("é😀")], doc_op![d("é😀")]);
        assert_compose(
            doc_op![i("ü😀\n"), rl(1)],
            doc_op![r(1), d("😀"), eol(1), rl(1)],
            doc_op![i("ü\n"), rl(1)],
        );
        // A retain may not end inside a surrogate pair
        assert_compose_fails(doc_op![i("😀")], doc_op![r(1), i("x"), r(1)]);
    }
}
