//! Entry Codec
//!
//! The boundary between raw storage strings and typed cache entries. Decoding
//! happens in two steps: the envelope first, so expiry can be checked for any
//! entry, then the value into the caller's type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheEntry;
use crate::error::CodecError;

/// Serializes an entry for storage.
pub fn encode_entry<T: Serialize>(entry: &CacheEntry<T>) -> Result<String, CodecError> {
    serde_json::to_string(entry).map_err(CodecError::Encode)
}

/// Parses the envelope of a stored entry, leaving the value untyped.
///
/// Anything that is not a JSON object with `value` and `timestamp` fields is
/// `Malformed`. A missing or null `expiry` means the entry never expires.
pub fn decode_envelope(raw: &str) -> Result<CacheEntry<Value>, CodecError> {
    serde_json::from_str(raw).map_err(CodecError::Malformed)
}

/// Converts an envelope's value into the requested type.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(CodecError::TypeMismatch)
}

/// Reads only the write timestamp of a stored entry; unparsable entries sort
/// first with a timestamp of zero.
pub fn timestamp_of(raw: &str) -> u64 {
    decode_envelope(raw).map(|entry| entry.timestamp).unwrap_or(0)
}
