//! Positions across a span of document history
//!
//! Records every operation applied to a document since tracking started and
//! maps positions between the document as it was then and as it is now.

use crate::error::Result;
use crate::ot::{compose_all, transform_position, DocOp, InsertBias, Position};

#[derive(Debug, Clone, Default)]
pub struct PositionMigrator {
    applied: Vec<DocOp>,
    bias: InsertBias,
}

impl PositionMigrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_bias(mut self, bias: InsertBias) -> Self {
        self.bias = bias;
        self
    }

    /// Note an operation that was applied to the document
    pub fn record(&mut self, op: DocOp) {
        self.applied.push(op);
    }

    pub fn has_changes(&self) -> bool {
        self.applied.iter().any(DocOp::contains_mutation)
    }

    /// Forget the recorded history, making now the new starting point
    pub fn reset(&mut self) {
        self.applied.clear();
    }

    /// Where a position in the starting document is now
    pub fn migrate_to_now(&mut self, position: Position) -> Result<Position> {
        let bias = self.bias;
        Ok(match self.composed()? {
            Some(op) => transform_position(position, op, bias),
            None => position,
        })
    }

    /// Where a position in the current document was in the starting document
    pub fn migrate_from_now(&mut self, position: Position) -> Result<Position> {
        let bias = self.bias;
        Ok(match self.composed()? {
            Some(op) => transform_position(position, &op.invert(), bias),
            None => position,
        })
    }

    /// Everything recorded so far as one operation
    ///
    /// The recorded list is replaced by the composition.
    fn composed(&mut self) -> Result<Option<&DocOp>> {
        if self.applied.len() > 1 {
            if let Some(op) = compose_all(&self.applied)? {
                self.applied = vec![op];
            }
        }
        Ok(self.applied.first())
    }
}
