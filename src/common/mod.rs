//! Common utilities shared by the runner, the scheduler and the remote client

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Check whether `actual` contains everything in `expected`
///
/// Objects match key-wise and recursively, so extra keys in `actual` are
/// ignored. Arrays match element-wise over the expected prefix. Scalars
/// must be equal.
pub fn json_contains(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    use serde_json::Value;

    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected.iter().all(|(key, value)| {
            actual
                .get(key)
                .map(|a| json_contains(a, value))
                .unwrap_or(false)
        }),
        (Value::Array(actual), Value::Array(expected)) => {
            expected.len() <= actual.len()
                && expected
                    .iter()
                    .zip(actual.iter())
                    .all(|(e, a)| json_contains(a, e))
        }
        (actual, expected) => actual == expected,
    }
}
