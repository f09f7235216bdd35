//! Protobuf messages for operations
//!
//! ```proto
//! message DocOpMessage {
//!   repeated ComponentMessage components = 1;
//! }
//!
//! message ComponentMessage {
//!   oneof kind {
//!     RetainMessage retain = 1;
//!     uint64 retain_line = 2;
//!     string insert = 3;
//!     string delete = 4;
//!   }
//! }
//!
//! message RetainMessage {
//!   uint64 count = 1;
//!   bool ends_with_newline = 2;
//! }
//!
//! message RevisionedDocOpMessage {
//!   uint64 revision = 1;
//!   DocOpMessage op = 2;
//! }
//! ```

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DocOpMessage {
    #[prost(message, repeated, tag = "1")]
    pub components: Vec<ComponentMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComponentMessage {
    #[prost(oneof = "component_message::Kind", tags = "1, 2, 3, 4")]
    pub kind: Option<component_message::Kind>,
}

pub mod component_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        Retain(super::RetainMessage),
        #[prost(uint64, tag = "2")]
        RetainLine(u64),
        #[prost(string, tag = "3")]
        Insert(String),
        #[prost(string, tag = "4")]
        Delete(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetainMessage {
    #[prost(uint64, tag = "1")]
    pub count: u64,
    #[prost(bool, tag = "2")]
    pub ends_with_newline: bool,
}

/// An operation as numbered by the server
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RevisionedDocOpMessage {
    #[prost(uint64, tag = "1")]
    pub revision: u64,
    #[prost(message, optional, tag = "2")]
    pub op: Option<DocOpMessage>,
}
