//! SyncKit OT - operational transformation for collaborative text editing
//!
//! Peers editing the same plain-text document exchange operations instead of
//! document snapshots. This crate implements the operation model and the
//! algorithms that keep peers convergent:
//! - Line-oriented operations (`DocOp`) built from retain, retain-line,
//!   insert and delete components
//! - Composition of sequential operations
//! - Transformation of concurrent operations
//! - Position (cursor) transformation
//! - Application to a text buffer, JSON and binary wire formats
//!
//! # Examples
//!
//! ```rust
//! use synckit_ot::{doc_op, TextDocument};
//!
//! // Both peers start from "hello\n"
//! let mut alice = TextDocument::from_text("hello\n");
//! let mut bob = alice.clone();
//!
//! let from_alice = alice.insert_op(0, 5, " world").unwrap();
//! let from_bob = bob.insert_op(0, 0, "oh, ").unwrap();
//!
//! let pair = from_alice.transform(&from_bob).unwrap();
//! alice.apply(&pair.server).unwrap();
//! bob.apply(&pair.client).unwrap();
//!
//! assert_eq!(alice.text(), "oh, hello world\n");
//! assert_eq!(alice, bob);
//! # let _ = doc_op![rl(1)];
//! ```

pub mod error;
pub mod ot;
pub mod protocol;
pub mod sync;

#[cfg(feature = "document")]
pub mod document;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use error::{OpError, Result};
pub use ot::{
    apply, compose, compose_all, transform, transform_position, Component, DocOp, DocOpBuilder,
    DocumentLines, DocumentMutator, InsertBias, OperationPair, Position, PositionTransformer,
};
pub use sync::{PositionMigrator, TransformQueue};

#[cfg(feature = "document")]
pub use document::{TextChange, TextChangeKind, TextDocument};
