//! Transformation of concurrent operations
//!
//! Given a client operation and a server operation that were both made
//! against the same document, [`transform`] produces `(client', server')`
//! such that applying `client` then `server'` gives the same document as
//! applying `server` then `client'`.
//!
//! Both operations are walked together. Each side has a cursor over its
//! current component; every step resolves the two cursors against each other,
//! writes to both outputs and advances whichever side finished its component.
//!
//! When both sides insert at the same position the client's text is placed
//! first. The order depends only on which operand is the client, so the two
//! peers of a session agree on it.
//!
//! # Example
//!
//! ```
//! use synckit_ot::doc_op;
//!
//! // "abc": the client types "X" at 1, the server deletes "c"
//! let client = doc_op![r(1), i("X"), r(2)];
//! let server = doc_op![r(2), d("c")];
//!
//! let pair = client.transform(&server).unwrap();
//! assert_eq!(pair.client, doc_op![r(1), i("X"), r(1)]);
//! assert_eq!(pair.server, doc_op![r(3), d("c")]);
//! ```

use super::builder::DocOpBuilder;
use super::component::Component;
use super::doc_op::DocOp;
use super::text;
use crate::error::{OpError, Result};
use serde::{Deserialize, Serialize};

type Step = std::result::Result<(), String>;

/// Result of transforming a client operation against a server operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPair {
    /// The client operation, to be applied after the server operation
    pub client: DocOp,
    /// The server operation, to be applied after the client operation
    pub server: DocOp,
}

/// Transform `client` and `server`, both made against the same document
pub fn transform(client: &DocOp, server: &DocOp) -> Result<OperationPair> {
    client.validate()?;
    server.validate()?;

    Transformer::default()
        .run(client, server)
        .map_err(|reason| {
            tracing::debug!(
                reason = %reason,
                client = %client,
                server = %server,
                "transform rejected"
            );
            OpError::Transform {
                reason,
                client: client.to_string(),
                server: server.to_string(),
            }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Client,
    Server,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Client => 0,
            Side::Server => 1,
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }
}

/// What is left of one side's current component
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Delete(String),
    Insert(String),
    Retain {
        count: usize,
        eol: bool,
    },
    /// `carried` counts code units the other side put on the current line
    /// before it ended; they are retained explicitly if the line end is
    /// deleted
    RetainLine {
        lines: usize,
        carried: usize,
    },
    /// The side has no components left
    Exhausted,
}

impl From<&Component> for Cursor {
    fn from(component: &Component) -> Self {
        match component {
            Component::Delete { text } => Cursor::Delete(text.clone()),
            Component::Insert { text } => Cursor::Insert(text.clone()),
            Component::Retain {
                count,
                ends_with_newline,
            } => Cursor::Retain {
                count: *count,
                eol: *ends_with_newline,
            },
            Component::RetainLine { line_count } => Cursor::RetainLine {
                lines: *line_count,
                carried: 0,
            },
        }
    }
}

#[derive(Debug)]
struct Transformer {
    outputs: [DocOpBuilder; 2],
    /// Side finished its current component during this step
    done: [bool; 2],
    /// Side inserted a line end during this step
    inserted_newline: [bool; 2],
    /// Side inserted a line end during the previous step
    inserted_newline_before: [bool; 2],
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            outputs: [DocOpBuilder::coalescing(), DocOpBuilder::coalescing()],
            done: [false; 2],
            inserted_newline: [false; 2],
            inserted_newline_before: [false; 2],
        }
    }
}

impl Transformer {
    fn run(mut self, client: &DocOp, server: &DocOp) -> std::result::Result<OperationPair, String> {
        let components = [client.components(), server.components()];
        let mut next = [0usize; 2];
        let mut cursors: [Option<Cursor>; 2] = [None, None];

        loop {
            for side in 0..2 {
                if cursors[side].is_none() {
                    let cursor = match components[side].get(next[side]) {
                        Some(component) => {
                            next[side] += 1;
                            Cursor::from(component)
                        }
                        None => Cursor::Exhausted,
                    };
                    cursors[side] = Some(cursor);
                }
            }

            let [Some(client_cursor), Some(server_cursor)] = &mut cursors else {
                return Err("cursor missing".to_string());
            };
            if *client_cursor == Cursor::Exhausted && *server_cursor == Cursor::Exhausted {
                break;
            }

            self.step(client_cursor, server_cursor)?;

            for side in 0..2 {
                if self.done[side] {
                    cursors[side] = None;
                }
            }
            self.inserted_newline_before = self.inserted_newline;
            self.inserted_newline = [false; 2];
            self.done = [false; 2];
        }

        let [mut client_output, mut server_output] = self.outputs;
        Ok(OperationPair {
            client: client_output.build(),
            server: server_output.build(),
        })
    }

    fn step(&mut self, client: &mut Cursor, server: &mut Cursor) -> Step {
        use Side::{Client, Server};

        match (client, server) {
            (Cursor::Exhausted, Cursor::Exhausted) => Ok(()),

            (Cursor::Insert(text), Cursor::RetainLine { lines, carried }) => {
                self.retain_line_against_insert(Server, lines, carried, Client, text);
                Ok(())
            }
            (Cursor::RetainLine { lines, carried }, Cursor::Insert(text)) => {
                self.retain_line_against_insert(Client, lines, carried, Server, text);
                Ok(())
            }
            // Inserts are placed before anything else; the client's first
            // when both sides insert
            (Cursor::Insert(text), _) => {
                self.insert_first(Client, text);
                Ok(())
            }
            (_, Cursor::Insert(text)) => {
                self.insert_first(Server, text);
                Ok(())
            }

            (Cursor::Delete(client_text), Cursor::Delete(server_text)) => {
                self.delete_against_delete(client_text, server_text)
            }
            (Cursor::Delete(text), Cursor::Retain { count, .. }) => {
                self.delete_against_retain(Client, text, Server, count)
            }
            (Cursor::Retain { count, .. }, Cursor::Delete(text)) => {
                self.delete_against_retain(Server, text, Client, count)
            }
            (Cursor::Delete(text), Cursor::RetainLine { lines, carried }) => {
                self.retain_line_against_delete(Server, lines, carried, Client, text);
                Ok(())
            }
            (Cursor::RetainLine { lines, carried }, Cursor::Delete(text)) => {
                self.retain_line_against_delete(Client, lines, carried, Server, text);
                Ok(())
            }
            (Cursor::Delete(_), Cursor::Exhausted) | (Cursor::Exhausted, Cursor::Delete(_)) => {
                Err("cannot delete past the end of the other operation".to_string())
            }

            (
                Cursor::Retain {
                    count: client_count,
                    eol: client_eol,
                },
                Cursor::Retain {
                    count: server_count,
                    eol: server_eol,
                },
            ) => {
                let (client_eol, server_eol) = (*client_eol, *server_eol);
                self.retain_against_retain(client_count, client_eol, server_count, server_eol);
                Ok(())
            }
            (Cursor::Retain { count, eol }, Cursor::RetainLine { lines, carried }) => {
                let (count, eol) = (*count, *eol);
                self.retain_line_against_retain(Server, lines, carried, Client, count, eol);
                Ok(())
            }
            (Cursor::RetainLine { lines, carried }, Cursor::Retain { count, eol }) => {
                let (count, eol) = (*count, *eol);
                self.retain_line_against_retain(Client, lines, carried, Server, count, eol);
                Ok(())
            }
            (Cursor::Retain { .. }, Cursor::Exhausted) | (Cursor::Exhausted, Cursor::Retain { .. }) => {
                Err("cannot retain past the end of the other operation".to_string())
            }

            (
                Cursor::RetainLine {
                    lines: client_lines,
                    ..
                },
                Cursor::RetainLine {
                    lines: server_lines,
                    ..
                },
            ) => {
                self.retain_line_against_retain_line(client_lines, server_lines);
                Ok(())
            }
            (Cursor::RetainLine { lines, .. }, Cursor::Exhausted) => {
                self.retain_line_against_exhausted(Client, lines)
            }
            (Cursor::Exhausted, Cursor::RetainLine { lines, .. }) => {
                self.retain_line_against_exhausted(Server, lines)
            }
        }
    }

    fn output(&mut self, side: Side) -> &mut DocOpBuilder {
        &mut self.outputs[side.index()]
    }

    fn finish(&mut self, side: Side) {
        self.done[side.index()] = true;
    }

    /// `side` inserts; the other side retains over the inserted text
    fn insert_first(&mut self, side: Side, text: &str) {
        let eol = text::ends_line(text);
        self.output(side).insert(text);
        self.output(side.other()).retain(text::len(text), eol);
        if eol {
            self.inserted_newline[side.index()] = true;
        }
        self.finish(side);
    }

    /// Both sides delete; the overlap is already gone on either side
    fn delete_against_delete(&mut self, client: &mut String, server: &mut String) -> Step {
        let common = text::len(client).min(text::len(server));
        let (client_head, client_rest) = split(client, common)?;
        let (server_head, server_rest) = split(server, common)?;
        if client_head != server_head {
            return Err(format!(
                "both sides delete different text: {:?} vs {:?}",
                client_head, server_head
            ));
        }

        let (client_rest, server_rest) = (client_rest.to_string(), server_rest.to_string());
        if client_rest.is_empty() {
            self.finish(Side::Client);
        } else {
            *client = client_rest;
        }
        if server_rest.is_empty() {
            self.finish(Side::Server);
        } else {
            *server = server_rest;
        }
        Ok(())
    }

    fn delete_against_retain(
        &mut self,
        delete_side: Side,
        deleted: &mut String,
        retain_side: Side,
        count: &mut usize,
    ) -> Step {
        let common = text::len(deleted).min(*count);
        let (head, rest) = split(deleted, common)?;
        self.output(delete_side).delete(head);

        let rest = rest.to_string();
        if rest.is_empty() {
            self.finish(delete_side);
        } else {
            *deleted = rest;
        }

        *count -= common;
        if *count == 0 {
            self.finish(retain_side);
        }
        Ok(())
    }

    fn retain_against_retain(
        &mut self,
        client_count: &mut usize,
        client_eol: bool,
        server_count: &mut usize,
        server_eol: bool,
    ) {
        let common = (*client_count).min(*server_count);
        for (side, count, eol) in [
            (Side::Client, client_count, client_eol),
            (Side::Server, server_count, server_eol),
        ] {
            let consumed = *count == common;
            self.output(side).retain(common, consumed && eol);
            *count -= common;
            if consumed {
                self.finish(side);
            }
        }
    }

    fn retain_line_against_retain_line(&mut self, client_lines: &mut usize, server_lines: &mut usize) {
        let common = (*client_lines).min(*server_lines);
        for (side, lines) in [(Side::Client, client_lines), (Side::Server, server_lines)] {
            self.output(side).retain_line(common);
            *lines -= common;
            if *lines == 0 {
                self.finish(side);
            }
        }
    }

    /// The other side reached the end of a line the `RetainLine` covers
    fn line_end(&mut self, side: Side, lines: &mut usize, carried: &mut usize, keep_line: bool) {
        if keep_line {
            self.output(side).retain_line(1);
        } else if *carried > 0 {
            self.output(side).retain(*carried, false);
        }
        *lines -= 1;
        *carried = 0;
        if *lines == 0 {
            self.finish(side);
        }
    }

    fn retain_line_against_delete(
        &mut self,
        line_side: Side,
        lines: &mut usize,
        carried: &mut usize,
        delete_side: Side,
        deleted: &str,
    ) {
        self.output(delete_side).delete(deleted);
        if text::ends_line(deleted) {
            self.line_end(line_side, lines, carried, false);
        }
        self.finish(delete_side);
    }

    fn retain_line_against_insert(
        &mut self,
        line_side: Side,
        lines: &mut usize,
        carried: &mut usize,
        insert_side: Side,
        inserted: &str,
    ) {
        self.output(insert_side).insert(inserted);
        if text::ends_line(inserted) {
            *lines += 1;
            self.line_end(line_side, lines, carried, true);
            self.inserted_newline[insert_side.index()] = true;
        } else {
            *carried += text::len(inserted);
        }
        self.finish(insert_side);
    }

    fn retain_line_against_retain(
        &mut self,
        line_side: Side,
        lines: &mut usize,
        carried: &mut usize,
        retain_side: Side,
        count: usize,
        eol: bool,
    ) {
        self.output(retain_side).retain(count, eol);
        *carried += count;
        if eol {
            self.line_end(line_side, lines, carried, true);
        }
        self.finish(retain_side);
    }

    /// Only the empty last line may be retained once the other side is done
    fn retain_line_against_exhausted(&mut self, side: Side, lines: &mut usize) -> Step {
        if *lines != 1 {
            return Err(format!(
                "cannot retain {} lines past the end of the other operation",
                lines
            ));
        }
        if self.inserted_newline_before[side.index()] {
            self.output(side.other()).retain_line(1);
        }
        *lines = 0;
        self.output(side).retain_line(1);
        self.finish(side);
        Ok(())
    }
}

fn split(text: &str, units: usize) -> std::result::Result<(&str, &str), String> {
    text::split_at(text, units)
        .ok_or_else(|| format!("cannot split {:?} after {} code units", text, units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;

    /// Single line of `size` code units with `text` inserted at `position`
    fn insert_at(size: usize, position: usize, text: &str) -> DocOp {
        DocOpBuilder::coalescing()
            .retain(position, false)
            .insert(text)
            .retain(size - position, false)
            .build()
    }

    /// Single line of `size` code units with `text` deleted at `position`
    fn delete_at(size: usize, position: usize, text: &str) -> DocOp {
        DocOpBuilder::coalescing()
            .retain(position, false)
            .delete(text)
            .retain(size - position - text::len(text), false)
            .build()
    }

    fn assert_transform(client: DocOp, server: DocOp, client_prime: DocOp, server_prime: DocOp) {
        let pair = transform(&client, &server).unwrap();
        assert_eq!(pair.client, client_prime, "client' of {} vs {}", client, server);
        assert_eq!(pair.server, server_prime, "server' of {} vs {}", client, server);
    }

    /// Same result with the roles swapped
    fn assert_reversible(client: DocOp, server: DocOp, client_prime: DocOp, server_prime: DocOp) {
        assert_transform(
            client.clone(),
            server.clone(),
            client_prime.clone(),
            server_prime.clone(),
        );
        assert_transform(server, client, server_prime, client_prime);
    }

    fn assert_transform_fails(client: DocOp, server: DocOp) {
        let result = transform(&client, &server);
        assert!(
            matches!(result, Err(OpError::Transform { .. })),
            "transforming {} vs {} gave {:?}",
            client,
            server,
            result
        );
    }

    #[test]
    fn test_delete_vs_delete_disjoint() {
        assert_reversible(
            delete_at(20, 1, "abcde"),
            delete_at(20, 7, "fg"),
            delete_at(18, 1, "abcde"),
            delete_at(15, 2, "fg"),
        );
    }

    #[test]
    fn test_delete_vs_delete_overlapping() {
        assert_reversible(
            delete_at(20, 1, "abcde"),
            delete_at(20, 3, "cdefghi"),
            delete_at(13, 1, "ab"),
            delete_at(15, 1, "fghi"),
        );
    }

    #[test]
    fn test_delete_vs_same_delete() {
        assert_reversible(
            delete_at(20, 1, "abc"),
            delete_at(20, 1, "abc"),
            doc_op![r(17)],
            doc_op![r(17)],
        );
    }

    #[test]
    fn test_insert_vs_delete() {
        assert_reversible(
            insert_at(20, 1, "abc"),
            delete_at(20, 2, "de"),
            insert_at(18, 1, "abc"),
            delete_at(23, 5, "de"),
        );
    }

    #[test]
    fn test_insert_vs_insert_different_positions() {
        assert_reversible(
            insert_at(20, 1, "abc"),
            insert_at(20, 5, "123"),
            insert_at(23, 1, "abc"),
            insert_at(23, 8, "123"),
        );
    }

    #[test]
    fn test_insert_vs_insert_same_position_client_first() {
        assert_transform(
            insert_at(20, 2, "abc"),
            insert_at(20, 2, "123"),
            insert_at(23, 2, "abc"),
            insert_at(23, 5, "123"),
        );
        assert_transform(
            insert_at(20, 2, "123"),
            insert_at(20, 2, "abc"),
            insert_at(23, 2, "123"),
            insert_at(23, 5, "abc"),
        );
    }

    #[test]
    fn test_insert_vs_newline_at_end_of_line() {
        assert_reversible(
            doc_op![r(6), i("f"), r(1)],
            doc_op![r(7), i("\n"), rl(1)],
            doc_op![r(6), i("f"), eol(2), rl(1)],
            doc_op![r(8), i("\n"), rl(1)],
        );
    }

    #[test]
    fn test_retain_line_carries_retain_over_deleted_line_end() {
        // "a\nb": the client deletes "b", the server joins the lines
        assert_reversible(
            doc_op![rl(1), d("b")],
            doc_op![r(1), d("\n"), r(1)],
            doc_op![r(1), d("b")],
            doc_op![r(1), d("\n")],
        );
    }

    #[test]
    fn test_retain_line_matching_non_empty_last_line() {
        let client = doc_op![rl(25), r(58), i("a"), eol(35), rl(1)];
        let server = doc_op![rl(26), r(58), i("b")];
        assert_reversible(client.clone(), server.clone(), client, server);
    }

    #[test]
    fn test_retain_line_past_other_side_fails() {
        assert_transform_fails(
            doc_op![rl(25), r(58), i("a"), eol(35), rl(2)],
            doc_op![rl(26), r(58), i("b")],
        );
    }

    #[test]
    fn test_empty_line_vs_retain_line() {
        assert_reversible(doc_op![], doc_op![rl(1)], doc_op![], doc_op![rl(1)]);
        assert_reversible(
            doc_op![d("\n")],
            doc_op![eol(1), rl(1)].compacted(),
            doc_op![d("\n")],
            doc_op![rl(1)],
        );
        assert_reversible(
            doc_op![r(2), d("\n")],
            doc_op![r(1), d("a"), eol(1), rl(1)],
            doc_op![r(1), d("\n")],
            doc_op![r(1), d("a"), rl(1)],
        );
    }

    #[test]
    fn test_newline_insert_keeps_empty_last_line() {
        assert_transform(
            doc_op![i("\n"), rl(1)],
            doc_op![i("f")],
            doc_op![i("\n"), rl(1)],
            doc_op![rl(1), i("f")],
        );
        assert_transform(
            doc_op![i("f")],
            doc_op![i("\n"), rl(1)],
            doc_op![i("f"), eol(1), rl(1)],
            doc_op![r(1), i("\n"), rl(1)],
        );
    }

    #[test]
    fn test_mismatched_operations_fail() {
        assert_transform_fails(doc_op![r(5)], doc_op![r(3)]);
        assert_transform_fails(doc_op![d("abc")], doc_op![r(2)]);
        assert_transform_fails(doc_op![d("ab")], doc_op![d("xy")]);
        assert_transform_fails(doc_op![rl(3)], doc_op![]);
    }

    #[test]
    fn test_identity_transform() {
        let op = doc_op![r(2), i("xy"), eol(3), rl(4)];
        let identity = doc_op![eol(5), rl(4)].compacted();
        let pair = transform(&op, &identity).unwrap();

        assert_eq!(pair.client, op.compacted());
        assert!(!pair.server.contains_mutation());
    }
}
