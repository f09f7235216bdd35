//! Document operations
//!
//! A [`DocOp`] is an immutable, ordered list of [`Component`]s describing one
//! edit as a walk over an entire document. Walking the components in order
//! covers every code unit of the document it applies to, so two operations
//! can be composed or transformed without looking at the document itself.

use super::builder::DocOpBuilder;
use super::component::Component;
use super::composer;
use super::transformer::{self, OperationPair};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::slice;

/// An edit to a line-oriented text document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocOp {
    components: Vec<Component>,
}

impl DocOp {
    /// The empty operation
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap components as given, checking each one
    pub fn from_components(components: Vec<Component>) -> Result<Self> {
        let op = Self { components };
        op.validate()?;
        Ok(op)
    }

    pub(crate) fn from_built(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    pub fn iter(&self) -> slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether applying this operation changes the document
    pub fn contains_mutation(&self) -> bool {
        self.components.iter().any(Component::is_mutation)
    }

    /// Check the invariants of every component
    pub fn validate(&self) -> Result<()> {
        self.components.iter().try_for_each(Component::validate)
    }

    /// The operation that undoes this one
    ///
    /// Inserts become deletes and deletes become inserts; retains are kept.
    pub fn invert(&self) -> DocOp {
        let components = self
            .components
            .iter()
            .map(|component| match component {
                Component::Insert { text } => Component::delete(text.clone()),
                Component::Delete { text } => Component::insert(text.clone()),
                retain => retain.clone(),
            })
            .collect();
        Self { components }
    }

    /// The same edit with adjacent components merged
    pub fn compacted(&self) -> DocOp {
        let mut builder = DocOpBuilder::coalescing();
        for component in &self.components {
            builder.push(component);
        }
        builder.build()
    }

    /// `self` followed by `next`, as a single operation
    pub fn compose(&self, next: &DocOp) -> Result<DocOp> {
        composer::compose(self, next)
    }

    /// Transform this (client) operation against a concurrent server operation
    pub fn transform(&self, server: &DocOp) -> Result<OperationPair> {
        transformer::transform(self, server)
    }
}

impl fmt::Display for DocOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DocOp {
    type Item = &'a Component;
    type IntoIter = slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

/// Build a [`DocOp`] from terse component literals
///
/// `r(n)` retains `n` code units, `eol(n)` retains `n` code units ending in a
/// newline, `rl(n)` retains `n` lines, `i(text)` inserts and `d(text)`
/// deletes. Components are kept as written.
///
/// ```
/// use synckit_ot::doc_op;
///
/// let op = doc_op![rl(2), r(3), i("x"), eol(4), rl(1)];
/// assert_eq!(op.to_string(), "RL(2)R(3)I(\"x\")R(4\\n)RL(1)");
/// ```
#[macro_export]
macro_rules! doc_op {
    (@push $builder:ident, r, $count:expr) => {
        $builder.retain($count, false);
    };
    (@push $builder:ident, eol, $count:expr) => {
        $builder.retain($count, true);
    };
    (@push $builder:ident, rl, $count:expr) => {
        $builder.retain_line($count);
    };
    (@push $builder:ident, i, $text:expr) => {
        $builder.insert($text);
    };
    (@push $builder:ident, d, $text:expr) => {
        $builder.delete($text);
    };
    ($($kind:ident ( $arg:expr )),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut builder = $crate::DocOpBuilder::verbatim();
        $( $crate::doc_op!(@push builder, $kind, $arg); )*
        builder.build()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;
    use crate::error::OpError;

    #[test]
    fn test_display() {
        let op = doc_op![rl(1), r(2), eol(3), i("a\n"), d("b")];
        assert_eq!(op.to_string(), "RL(1)R(2)R(3\\n)I(\"a\\n\")D(\"b\")");
        assert_eq!(DocOp::new().to_string(), "");
    }

    #[test]
    fn test_contains_mutation() {
        assert!(!doc_op![rl(3), r(2)].contains_mutation());
        assert!(doc_op![r(2), d("x")].contains_mutation());
        assert!(doc_op![i("x")].contains_mutation());
        assert!(!DocOp::new().contains_mutation());
    }

    #[test]
    fn test_invert_swaps_inserts_and_deletes() {
        let op = doc_op![r(1), d("ab"), i("cd\n"), rl(2)];
        assert_eq!(op.invert(), doc_op![r(1), i("ab"), d("cd\n"), rl(2)]);
        assert_eq!(op.invert().invert(), op);
    }

    #[test]
    fn test_compacted() {
        let op = doc_op![r(1), eol(2), i("a"), i("b"), rl(1), rl(2)];
        assert_eq!(op.compacted(), doc_op![rl(1), i("ab"), rl(3)]);
    }

    #[test]
    fn test_from_components_validates() {
        let ok = DocOp::from_components(vec![Component::insert("a\n"), Component::retain_line(1)]);
        assert!(ok.is_ok());

        let err = DocOp::from_components(vec![Component::insert("a\nb")]).unwrap_err();
        assert!(matches!(err, OpError::Malformed(_)));
    }

    #[test]
    fn test_serializes_as_component_list() {
        let op = doc_op![rl(1), i("x")];
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"retainLine","lineCount":1},{"type":"insert","text":"x"}]"#
        );
        let back: DocOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
