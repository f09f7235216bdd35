//! Session-level helpers built on the operation core
//!
//! - [`TransformQueue`]: revision tracking and transformation for a client
//!   exchanging operations with a server
//! - [`PositionMigrator`]: maps positions across everything applied since a
//!   starting point

pub mod position_migrator;
pub mod transform_queue;

pub use position_migrator::PositionMigrator;
pub use transform_queue::TransformQueue;
