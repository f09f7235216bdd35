//! Client-side concurrency control
//!
//! A client talks to a server that orders every operation into a single
//! history of numbered revisions. While its own operations are in flight the
//! client keeps receiving operations from other peers, so both sides have to
//! be transformed against each other before they can be applied.
//!
//! [`TransformQueue`] holds the four pieces of state this takes:
//!
//! - the last revision the client knows about
//! - server operations received but not yet applied to the local document
//! - client operations sent to the server and not yet acknowledged
//! - client operations applied locally but not yet sent
//!
//! The client always takes the client side of [`transform`], so its own text
//! goes first when both sides insert at the same point.

use crate::error::{OpError, Result};
use crate::ot::{compose_all, transform, DocOp};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct TransformQueue {
    revision: Option<u64>,
    expected_acked_client_ops: usize,
    server_ops: VecDeque<DocOp>,
    unacked_client_ops: VecDeque<DocOp>,
    queued_client_ops: Vec<DocOp>,
    new_client_op_since_transform: bool,
}

impl TransformQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking at `revision`
    pub fn init(&mut self, revision: u64) -> Result<()> {
        if let Some(current) = self.revision {
            return Err(OpError::Queue(format!(
                "already at revision {}, cannot init at {}",
                current, revision
            )));
        }
        self.revision = Some(revision);
        Ok(())
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Accept an operation from another peer that the server numbered
    /// `resulting_revision`
    ///
    /// The operation is transformed past every unacknowledged and queued
    /// client operation, which are replaced by their transformed versions.
    /// The result is available from [`remove_server_op`](Self::remove_server_op).
    pub fn server_op(&mut self, resulting_revision: u64, server_op: DocOp) -> Result<()> {
        self.check_revision(resulting_revision)?;
        if self.expected_acked_client_ops > 0 {
            return Err(OpError::Queue(format!(
                "server op arrived at revision {} while expecting {} acknowledgements",
                resulting_revision, self.expected_acked_client_ops
            )));
        }

        let (unacked, server_op) = transform_client_ops(&self.unacked_client_ops, server_op)?;

        let queued = if self.new_client_op_since_transform {
            compact(&self.queued_client_ops)?
        } else {
            self.queued_client_ops.clone()
        };
        let (queued, server_op) = transform_client_ops(&queued, server_op)?;

        self.revision = Some(resulting_revision);
        self.unacked_client_ops = unacked.into();
        self.queued_client_ops = queued;
        self.new_client_op_since_transform = false;
        self.server_ops.push_back(server_op);
        Ok(())
    }

    /// Queue an operation made locally
    ///
    /// Server operations not yet applied locally are transformed past it, so
    /// that they apply on top of the edited document.
    pub fn client_op(&mut self, client_op: DocOp) -> Result<()> {
        let mut client_op = client_op;
        let mut server_ops = VecDeque::with_capacity(self.server_ops.len());
        for server_op in &self.server_ops {
            let pair = transform(&client_op, server_op)?;
            server_ops.push_back(pair.server);
            client_op = pair.client;
        }

        self.server_ops = server_ops;
        self.queued_client_ops.push(client_op);
        self.new_client_op_since_transform = true;
        Ok(())
    }

    /// Account for one of our own operations echoed back by the server at
    /// `resulting_revision`
    ///
    /// Returns `false` when no acknowledgement is outstanding, in which case
    /// the caller should treat the operation as coming from another peer.
    pub fn expected_ack(&mut self, resulting_revision: u64) -> Result<bool> {
        if self.expected_acked_client_ops == 0 {
            return Ok(false);
        }

        let revision = self.current_revision()?;
        let expected = (revision + 1).saturating_sub(self.expected_acked_client_ops as u64);
        if resulting_revision != expected {
            return Err(OpError::Revision {
                expected,
                received: resulting_revision,
            });
        }
        self.expected_acked_client_ops -= 1;
        Ok(true)
    }

    /// The server accepted the oldest unacknowledged client operation as
    /// `resulting_revision`
    ///
    /// Returns whether every sent operation is now acknowledged.
    pub fn ack_client_op(&mut self, resulting_revision: u64) -> Result<bool> {
        self.check_revision(resulting_revision)?;
        if self.expected_acked_client_ops > 0 {
            return Err(OpError::Queue(format!(
                "{} acknowledgements must be consumed with expected_ack first",
                self.expected_acked_client_ops
            )));
        }
        if self.unacked_client_ops.pop_front().is_none() {
            return Err(OpError::Queue(
                "no unacknowledged client ops".to_string(),
            ));
        }

        self.revision = Some(resulting_revision);
        Ok(self.unacked_client_ops.is_empty())
    }

    /// Acknowledge every sent operation at once when the server reports
    /// `new_revision` as the result of all of them
    ///
    /// Their echoes are then consumed one by one through
    /// [`expected_ack`](Self::expected_ack). Returns `None` if the revision
    /// does not match.
    pub fn ack_ops_if_version_matches(&mut self, new_revision: u64) -> Option<Vec<DocOp>> {
        let revision = self.revision?;
        if new_revision != revision + self.unacked_client_ops.len() as u64 {
            return None;
        }

        let acked: Vec<DocOp> = self.unacked_client_ops.drain(..).collect();
        self.expected_acked_client_ops += acked.len();
        self.revision = Some(new_revision);
        Some(acked)
    }

    /// Move the queued client operations to the unacknowledged list, composed
    /// into a single operation, and return what should be sent
    pub fn push_queued_ops_to_unacked(&mut self) -> Result<Vec<DocOp>> {
        if !self.unacked_client_ops.is_empty() {
            return Err(OpError::Queue(format!(
                "{} client ops are still unacknowledged",
                self.unacked_client_ops.len()
            )));
        }

        let compacted = compact(&self.queued_client_ops)?;
        self.queued_client_ops.clear();
        self.new_client_op_since_transform = false;
        self.unacked_client_ops = compacted.iter().cloned().collect();
        Ok(compacted)
    }

    pub fn has_server_op(&self) -> bool {
        !self.server_ops.is_empty()
    }

    pub fn peek_server_op(&self) -> Option<&DocOp> {
        self.server_ops.front()
    }

    /// Next server operation, ready to apply to the local document
    pub fn remove_server_op(&mut self) -> Option<DocOp> {
        self.server_ops.pop_front()
    }

    pub fn has_unacknowledged_client_ops(&self) -> bool {
        !self.unacked_client_ops.is_empty()
    }

    pub fn unacknowledged_client_op_count(&self) -> usize {
        self.unacked_client_ops.len()
    }

    pub fn has_queued_client_ops(&self) -> bool {
        !self.queued_client_ops.is_empty()
    }

    pub fn queued_client_op_count(&self) -> usize {
        self.queued_client_ops.len()
    }

    fn current_revision(&self) -> Result<u64> {
        self.revision
            .ok_or_else(|| OpError::Queue("queue has not been initialized".to_string()))
    }

    fn check_revision(&self, resulting_revision: u64) -> Result<()> {
        let revision = self.current_revision()?;
        if resulting_revision != revision + 1 {
            tracing::warn!(
                revision,
                received = resulting_revision,
                "revision mismatch"
            );
            return Err(OpError::Revision {
                expected: revision + 1,
                received: resulting_revision,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TransformQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision {
            Some(revision) => write!(f, "TQ{{ {}", revision)?,
            None => write!(f, "TQ{{ -")?,
        }
        writeln!(f)?;
        writeln!(f, "  s: [{}]", join(&self.server_ops))?;
        writeln!(f, "  exp: {}", self.expected_acked_client_ops)?;
        writeln!(f, "  u: [{}]", join(&self.unacked_client_ops))?;
        writeln!(f, "  q: [{}]", join(&self.queued_client_ops))?;
        write!(f, "}}")
    }
}

fn join<'a>(ops: impl IntoIterator<Item = &'a DocOp>) -> String {
    ops.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Transform `server_op` past each client op in turn
fn transform_client_ops<'a, I>(client_ops: I, server_op: DocOp) -> Result<(Vec<DocOp>, DocOp)>
where
    I: IntoIterator<Item = &'a DocOp>,
{
    let mut server_op = server_op;
    let mut transformed = Vec::new();
    for client_op in client_ops {
        let pair = transform(client_op, &server_op)?;
        transformed.push(pair.client);
        server_op = pair.server;
    }
    Ok((transformed, server_op))
}

fn compact(ops: &[DocOp]) -> Result<Vec<DocOp>> {
    Ok(compose_all(ops)?.into_iter().collect())
}
