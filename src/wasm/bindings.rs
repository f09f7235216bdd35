//! JavaScript bindings for operations and documents

use crate::document::TextDocument;
use crate::error::OpError;
use crate::ot::{transform_position, DocOp, InsertBias, Position};
use crate::protocol;
use wasm_bindgen::prelude::*;

fn to_js(err: OpError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript-friendly wrapper for DocOp
#[wasm_bindgen]
#[derive(Clone)]
pub struct WasmDocOp {
    inner: DocOp,
}

#[wasm_bindgen]
impl WasmDocOp {
    /// Parse an operation from its JSON form
    #[wasm_bindgen(js_name = fromJSON)]
    pub fn from_json(json: &str) -> Result<WasmDocOp, JsValue> {
        let inner = protocol::decode_json(json).map_err(to_js)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        protocol::encode_json(&self.inner).map_err(to_js)
    }

    /// Terse notation, e.g. `RL(2)R(3)I("x")`
    #[wasm_bindgen(js_name = toString)]
    pub fn to_terse_string(&self) -> String {
        self.inner.to_string()
    }

    #[wasm_bindgen(js_name = containsMutation)]
    pub fn contains_mutation(&self) -> bool {
        self.inner.contains_mutation()
    }

    /// This operation followed by `next`, as one operation
    pub fn compose(&self, next: &WasmDocOp) -> Result<WasmDocOp, JsValue> {
        let inner = self.inner.compose(&next.inner).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Transform this client operation against a concurrent server operation
    pub fn transform(&self, server: &WasmDocOp) -> Result<WasmOperationPair, JsValue> {
        let pair = self.inner.transform(&server.inner).map_err(to_js)?;
        Ok(WasmOperationPair {
            client: Self { inner: pair.client },
            server: Self { inner: pair.server },
        })
    }

    /// Operation undoing this one
    pub fn invert(&self) -> WasmDocOp {
        Self {
            inner: self.inner.invert(),
        }
    }

    /// Move a position through this operation
    ///
    /// With `advance`, text inserted exactly at the position pushes it
    /// forward.
    #[wasm_bindgen(js_name = transformPosition)]
    pub fn transform_position(&self, line: u32, column: u32, advance: bool) -> WasmPosition {
        let bias = if advance {
            InsertBias::Advance
        } else {
            InsertBias::Stay
        };
        let position = Position::new(line as usize, column as usize);
        transform_position(position, &self.inner, bias).into()
    }
}

#[cfg(feature = "protocol-binary")]
#[wasm_bindgen]
impl WasmDocOp {
    #[wasm_bindgen(js_name = fromBase64)]
    pub fn from_base64(text: &str) -> Result<WasmDocOp, JsValue> {
        let inner = protocol::decode_base64(text).map_err(to_js)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = toBase64)]
    pub fn to_base64(&self) -> Result<String, JsValue> {
        protocol::encode_base64(&self.inner).map_err(to_js)
    }
}

/// Result of `WasmDocOp.transform`
#[wasm_bindgen]
pub struct WasmOperationPair {
    client: WasmDocOp,
    server: WasmDocOp,
}

#[wasm_bindgen]
impl WasmOperationPair {
    /// Client operation to apply after the server operation
    #[wasm_bindgen(getter)]
    pub fn client(&self) -> WasmDocOp {
        self.client.clone()
    }

    /// Server operation to apply after the client operation
    #[wasm_bindgen(getter)]
    pub fn server(&self) -> WasmDocOp {
        self.server.clone()
    }
}

#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct WasmPosition {
    pub line: u32,
    pub column: u32,
}

impl From<Position> for WasmPosition {
    fn from(position: Position) -> Self {
        Self {
            line: position.line as u32,
            column: position.column as u32,
        }
    }
}

/// JavaScript-friendly wrapper for TextDocument
#[wasm_bindgen]
pub struct WasmTextDocument {
    inner: TextDocument,
}

#[wasm_bindgen]
impl WasmTextDocument {
    #[wasm_bindgen(constructor)]
    pub fn new(text: &str) -> Self {
        Self {
            inner: TextDocument::from_text(text),
        }
    }

    pub fn text(&self) -> String {
        self.inner.text()
    }

    #[wasm_bindgen(js_name = lineCount)]
    pub fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    /// Insert text and return the operation to send to other peers
    pub fn insert(&mut self, line: usize, column: usize, text: &str) -> Result<WasmDocOp, JsValue> {
        let inner = self.inner.insert_op(line, column, text).map_err(to_js)?;
        Ok(WasmDocOp { inner })
    }

    /// Delete text and return the operation to send to other peers
    pub fn delete(&mut self, line: usize, column: usize, count: usize) -> Result<WasmDocOp, JsValue> {
        let inner = self.inner.delete_op(line, column, count).map_err(to_js)?;
        Ok(WasmDocOp { inner })
    }

    /// Apply an operation received from another peer
    pub fn apply(&mut self, op: &WasmDocOp) -> Result<(), JsValue> {
        self.inner.apply(&op.inner).map_err(to_js)
    }
}
