//! Wire formats for operations
//!
//! JSON is always available. Each component is an object tagged by `type`:
//!
//! ```json
//! [{"type":"retainLine","lineCount":2},
//!  {"type":"retain","count":3,"endsWithNewline":false},
//!  {"type":"insert","text":"x"}]
//! ```
//!
//! With the `protocol-binary` feature operations can also be encoded as
//! protobuf messages, and as base64 text for transports that only carry
//! strings.
//!
//! Decoding always checks the component invariants, so a decoded operation
//! can be handed straight to compose or transform.

#[cfg(feature = "protocol-binary")]
pub mod messages;
#[cfg(feature = "protocol-binary")]
pub mod serialize;

#[cfg(feature = "protocol-binary")]
pub use serialize::{decode_base64, decode_binary, encode_base64, encode_binary};

use crate::error::Result;
use crate::ot::{DocOp, OperationPair};

/// Encode an operation as JSON
pub fn encode_json(op: &DocOp) -> Result<String> {
    Ok(serde_json::to_string(op)?)
}

/// Decode an operation from JSON
pub fn decode_json(json: &str) -> Result<DocOp> {
    let op: DocOp = serde_json::from_str(json)?;
    op.validate()?;
    Ok(op)
}

/// Encode a transformed pair as `{"client": [...], "server": [...]}`
pub fn encode_pair_json(pair: &OperationPair) -> Result<String> {
    Ok(serde_json::to_string(pair)?)
}

pub fn decode_pair_json(json: &str) -> Result<OperationPair> {
    let pair: OperationPair = serde_json::from_str(json)?;
    pair.client.validate()?;
    pair.server.validate()?;
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_op;
    use crate::error::OpError;

    #[test]
    fn test_json_round_trip() {
        let op = doc_op![rl(2), r(3), d("ab\n"), i("x"), eol(4), rl(1)];
        let json = encode_json(&op).unwrap();
        assert_eq!(decode_json(&json).unwrap(), op);
    }

    #[test]
    fn test_json_layout() {
        let json = encode_json(&doc_op![rl(2), r(3), i("x")]).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"retainLine","lineCount":2},{"type":"retain","count":3,"endsWithNewline":false},{"type":"insert","text":"x"}]"#
        );
    }

    #[test]
    fn test_decode_rejects_malformed_components() {
        assert!(matches!(
            decode_json(r#"[{"type":"retain","count":0,"endsWithNewline":false}]"#),
            Err(OpError::Malformed(_))
        ));
        assert!(matches!(
            decode_json(r#"[{"type":"insert","text":"a\nb"}]"#),
            Err(OpError::Malformed(_))
        ));
        assert!(matches!(
            decode_json(r#"[{"type":"move","count":1}]"#),
            Err(OpError::Serialization(_))
        ));
        assert!(matches!(decode_json("{"), Err(OpError::Serialization(_))));
    }

    #[test]
    fn test_pair_round_trip() {
        let client = doc_op![r(1), i("X"), r(1)];
        let server = doc_op![r(2), i("Y")];
        let pair = client.transform(&server).unwrap();

        let json = encode_pair_json(&pair).unwrap();
        assert!(json.starts_with(r#"{"client":"#));
        assert_eq!(decode_pair_json(&json).unwrap(), pair);
    }
}
