//! JSON codec for stored values
//!
//! Plain values are stored as ordinary JSON. Hash-field values go through a
//! buffer-aware replacer/reviver pair so byte sequences survive the trip
//! through text intact:
//!
//! ```text
//! {"type":"Buffer","data":"AQID"}      <- canonical form, written by `Buffer`
//! {"type":"Buffer","data":[1,2,3]}     <- array form, normalized on write and read
//! ```
//!
//! `Buffer` itself decodes either form, so plain values read back too.

use super::errors::{CacheError, CacheResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const BUFFER_TAG: &str = "Buffer";

/// Byte sequence that serializes in the tagged buffer form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Buffer(Vec<u8>);

impl Buffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Serialize)]
struct TaggedBuffer {
    #[serde(rename = "type")]
    kind: String,
    data: String,
}

impl Serialize for Buffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedBuffer {
            kind: BUFFER_TAG.to_string(),
            data: STANDARD.encode(&self.0),
        }
        .serialize(serializer)
    }
}

/// Either encoding of a buffer's `data` member
#[derive(Deserialize)]
#[serde(untagged)]
enum BufferData {
    Base64(String),
    Bytes(Vec<u8>),
}

#[derive(Deserialize)]
struct IncomingBuffer {
    #[serde(rename = "type")]
    kind: String,
    data: BufferData,
}

impl<'de> Deserialize<'de> for Buffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let incoming = IncomingBuffer::deserialize(deserializer)?;
        if incoming.kind != BUFFER_TAG {
            return Err(D::Error::custom(format!(
                "expected type \"{BUFFER_TAG}\", found \"{}\"",
                incoming.kind
            )));
        }
        match incoming.data {
            BufferData::Base64(text) => STANDARD
                .decode(text.as_bytes())
                .map(Buffer)
                .map_err(D::Error::custom),
            BufferData::Bytes(bytes) => Ok(Buffer(bytes)),
        }
    }
}

/// Serialize a plain value
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a plain value
pub fn from_json<T: DeserializeOwned>(text: &str) -> CacheResult<T> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize a hash-field value, folding array-form buffers into base64
pub fn to_hash_json<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    let mut tree = serde_json::to_value(value)?;
    replace_buffers(&mut tree)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Parse a hash-field value, reviving array-form buffers before decoding
pub fn from_hash_json<T: DeserializeOwned>(text: &str) -> CacheResult<T> {
    let mut tree: Value = serde_json::from_str(text)?;
    replace_buffers(&mut tree)?;
    Ok(serde_json::from_value(tree)?)
}

/// Rewrite every tagged buffer in `value` into the canonical base64 form
fn replace_buffers(value: &mut Value) -> CacheResult<()> {
    if let Value::Object(map) = value {
        if let Some(canonical) = canonical_buffer(map)? {
            *value = canonical;
            return Ok(());
        }
    }

    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                replace_buffers(child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                replace_buffers(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// `Some` when `map` is exactly `{type: "Buffer", data: [bytes]}`
fn canonical_buffer(map: &Map<String, Value>) -> CacheResult<Option<Value>> {
    if map.len() != 2 || map.get("type").and_then(Value::as_str) != Some(BUFFER_TAG) {
        return Ok(None);
    }
    let Some(Value::Array(items)) = map.get("data") else {
        return Ok(None);
    };

    let bytes = items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    CacheError::SerializationError(format!("invalid buffer byte: {item}"))
                })
        })
        .collect::<CacheResult<Vec<u8>>>()?;

    Ok(Some(serde_json::to_value(Buffer(bytes))?))
}
