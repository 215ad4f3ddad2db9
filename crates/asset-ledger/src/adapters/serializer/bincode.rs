use crate::domain::errors::SerializationError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a stored value with bincode.
///
/// Encoding is deterministic for the ledger's types (ordered maps only),
/// which the store's compare-and-swap guards rely on.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(value).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}

/// Decode a stored value with bincode.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}
