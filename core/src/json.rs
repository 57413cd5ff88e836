//! JSON helpers for request and response bodies.
//!
//! Both helpers panic instead of returning an error. A value that does not
//! serialize, or a body that does not parse, is a mistake in the test fixture
//! rather than a condition under test, and the failing test should stop with
//! the full serde message.

use serde::Serialize;
use serde_json::{Map, Value};

/// An untyped JSON object, for assertions on bodies without a known schema.
pub type Dict = Map<String, Value>;

/// Serializes `value` to JSON bytes.
///
/// # Panics
/// Panics if `value` cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_else(|e| panic!("JSON encode failed: {e}"))
}

/// Parses JSON bytes into a [`Dict`].
///
/// # Panics
/// Panics if `bytes` is not a JSON object.
pub fn decode(bytes: &[u8]) -> Dict {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        panic!(
            "JSON decode failed: {e}; input: {}",
            String::from_utf8_lossy(bytes)
        )
    })
}
