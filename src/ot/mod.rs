//! Operational transformation for line-oriented plain text
//!
//! This module contains the operation model and the algorithms built on it:
//!
//! - [`DocOp`] / [`Component`]: an edit expressed as a walk over a document
//! - [`DocOpBuilder`]: the only way operations are assembled
//! - [`compose`]: two sequential operations as one
//! - [`transform`]: two concurrent operations made applicable in either order
//! - [`PositionTransformer`]: cursors and markers through an applied operation
//! - [`apply`]: an operation replayed against a concrete document
//!
//! # Properties
//!
//! - **Composition:** applying `compose(a, b)` equals applying `a` then `b`
//! - **Convergence:** with `(a', b') = transform(a, b)`, applying `a` then `b'`
//!   equals applying `b` then `a'`
//! - **Symmetry:** `transform(b, a)` returns the same pair with roles swapped,
//!   except that the client's text goes first when both insert at one point
//!
//! # Example
//!
//! ```
//! use synckit_ot::doc_op;
//!
//! // Both peers start from "ab"
//! let client = doc_op![r(1), i("X"), r(1)];
//! let server = doc_op![r(2), i("Y")];
//!
//! let pair = client.transform(&server).unwrap();
//! let via_server = server.compose(&pair.client).unwrap();
//! let via_client = client.compose(&pair.server).unwrap();
//!
//! assert_eq!(via_server, via_client);
//! ```

pub mod applier;
pub mod builder;
pub mod component;
pub mod composer;
pub mod doc_op;
pub mod position;
pub mod text;
pub mod transformer;

pub use applier::{apply, DocumentLines, DocumentMutator};
pub use builder::DocOpBuilder;
pub use component::Component;
pub use composer::{compose, compose_all};
pub use doc_op::DocOp;
pub use position::{transform_position, InsertBias, Position, PositionTransformer};
pub use transformer::{transform, OperationPair};
