//! Pluggable context serialization.
//!
//! The spec requires only that `deserialize(serialize(x))` reproduce an
//! equivalent context when both sides use the same serializer — it does
//! not mandate a wire format. The default is JSON; a richer codec that
//! preserves types JSON can't (dates, maps, sets, errors) can be dropped in
//! behind the same trait.

use serde_json::Value;

use crate::error::ContextError;

pub trait Serializer: Send + Sync {
    fn serialize(&self, snapshot: &Value) -> Result<Vec<u8>, ContextError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ContextError>;
}

/// Default serializer: `serde_json`, byte-for-byte round-trip guaranteed
/// only for values `serde_json::Value` can represent natively.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, snapshot: &Value) -> Result<Vec<u8>, ContextError> {
        Ok(serde_json::to_vec(snapshot)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ContextError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_reproduces_equivalent_value() {
        let s = JsonSerializer;
        let original = json!({"a": 1, "b": [1, 2, 3], "c": {"nested": true}});
        let bytes = s.serialize(&original).unwrap();
        let restored = s.deserialize(&bytes).unwrap();
        assert_eq!(original, restored);
    }
}
