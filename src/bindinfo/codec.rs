//! Framed binary encoding for persisted hint data.
//!
//! Layout: `[magic: 4][version: u32 LE][crc32: u32 LE][bincode body]`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SableError};

/// Current encoding version.
pub const CURRENT_VERSION: u32 = 1;

const HEADER_LEN: usize = 12;

pub(crate) fn encode<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>> {
    let body = bincode::serialize(value)
        .map_err(|e| SableError::CorruptedHints(format!("Failed to serialize: {e}")))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(magic);
    out.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub(crate) fn decode<T: DeserializeOwned>(magic: &[u8; 4], data: &[u8]) -> Result<T> {
    if data.len() < HEADER_LEN {
        return Err(SableError::CorruptedHints(format!(
            "Data too short for header: {} bytes",
            data.len()
        )));
    }
    if &data[0..4] != magic {
        return Err(SableError::CorruptedHints("Invalid magic bytes".into()));
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version > CURRENT_VERSION {
        return Err(SableError::UnsupportedVersion {
            version,
            max_supported: CURRENT_VERSION,
        });
    }

    let expected = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    let body = &data[HEADER_LEN..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(SableError::ChecksumError(format!(
            "expected {expected:#010x}, computed {actual:#010x}"
        )));
    }

    bincode::deserialize(body)
        .map_err(|e| SableError::CorruptedHints(format!("Failed to deserialize: {e}")))
}
