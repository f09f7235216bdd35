//! Binary encoding of operations
//!
//! Converts between [`DocOp`] and the protobuf messages in
//! [`messages`](super::messages).

use super::messages::{component_message::Kind, ComponentMessage, DocOpMessage, RetainMessage, RevisionedDocOpMessage};
use crate::error::{OpError, Result};
use crate::ot::{Component, DocOp};
use base64::Engine;
use bytes::{Bytes, BytesMut};
use prost::Message;

impl From<&Component> for ComponentMessage {
    fn from(component: &Component) -> Self {
        let kind = match component {
            Component::Retain {
                count,
                ends_with_newline,
            } => Kind::Retain(RetainMessage {
                count: *count as u64,
                ends_with_newline: *ends_with_newline,
            }),
            Component::RetainLine { line_count } => Kind::RetainLine(*line_count as u64),
            Component::Insert { text } => Kind::Insert(text.clone()),
            Component::Delete { text } => Kind::Delete(text.clone()),
        };
        ComponentMessage { kind: Some(kind) }
    }
}

impl TryFrom<ComponentMessage> for Component {
    type Error = OpError;

    fn try_from(message: ComponentMessage) -> Result<Self> {
        let component = match message.kind {
            Some(Kind::Retain(retain)) => {
                Component::retain(to_usize(retain.count)?, retain.ends_with_newline)
            }
            Some(Kind::RetainLine(lines)) => Component::retain_line(to_usize(lines)?),
            Some(Kind::Insert(text)) => Component::insert(text),
            Some(Kind::Delete(text)) => Component::delete(text),
            None => return Err(OpError::Protocol("component without a kind".to_string())),
        };
        component.validate()?;
        Ok(component)
    }
}

impl From<&DocOp> for DocOpMessage {
    fn from(op: &DocOp) -> Self {
        DocOpMessage {
            components: op.iter().map(ComponentMessage::from).collect(),
        }
    }
}

impl TryFrom<DocOpMessage> for DocOp {
    type Error = OpError;

    fn try_from(message: DocOpMessage) -> Result<Self> {
        let components = message
            .components
            .into_iter()
            .map(Component::try_from)
            .collect::<Result<Vec<_>>>()?;
        DocOp::from_components(components)
    }
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| OpError::Protocol(format!("count {} does not fit this platform", value)))
}

/// Serialize any protocol message to bytes
pub fn encode_message<M: Message>(msg: &M) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)
        .map_err(|e| OpError::Protocol(format!("Failed to encode message: {}", e)))?;
    Ok(buf.freeze())
}

/// Deserialize a protocol message from bytes
pub fn decode_message<M: Message + Default>(bytes: &[u8]) -> Result<M> {
    M::decode(bytes).map_err(|e| OpError::Protocol(format!("Failed to decode message: {}", e)))
}

pub fn encode_binary(op: &DocOp) -> Result<Bytes> {
    encode_message(&DocOpMessage::from(op))
}

pub fn decode_binary(bytes: &[u8]) -> Result<DocOp> {
    DocOp::try_from(decode_message::<DocOpMessage>(bytes)?)
}

/// Encode an operation together with the revision it produces
pub fn encode_revisioned(revision: u64, op: &DocOp) -> Result<Bytes> {
    encode_message(&RevisionedDocOpMessage {
        revision,
        op: Some(DocOpMessage::from(op)),
    })
}

pub fn decode_revisioned(bytes: &[u8]) -> Result<(u64, DocOp)> {
    let message = decode_message::<RevisionedDocOpMessage>(bytes)?;
    let op = message
        .op
        .ok_or_else(|| OpError::Protocol("revisioned message without an op".to_string()))?;
    Ok((message.revision, DocOp::try_from(op)?))
}

/// Binary encoding as standard base64 text
pub fn encode_base64(op: &DocOp) -> Result<String> {
    let engine = base64::engine::general_purpose::STANDARD;
    Ok(engine.encode(encode_binary(op)?))
}

pub fn decode_base64(text: &str) -> Result<DocOp> {
    let engine = base64::engine::general_purpose::STANDARD;
    let bytes = engine
        .decode(text)
        .map_err(|e| OpError::Protocol(format!("Invalid base64: {}", e)))?;
    decode_binary(&bytes)
}
