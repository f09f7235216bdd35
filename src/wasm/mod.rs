//! JavaScript bindings
//!
//! Thin wrappers over the operation core for use from a browser editor.
//! Errors surface as JavaScript exceptions carrying the error message.

pub mod bindings;

pub use bindings::{WasmDocOp, WasmOperationPair, WasmPosition, WasmTextDocument};

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}
