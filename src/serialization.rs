/// Serialization format options for persisted triangulations.
///
/// Both variants encode with bincode; the `Lz4` variant compresses the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SerializationFormat {
    /// Plain bincode, fastest to read back
    Bincode,
    /// Bincode with LZ4 compression (default, best balance of size and speed)
    #[default]
    BincodeLz4,
}

impl SerializationFormat {
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool {
        matches!(self, SerializationFormat::BincodeLz4)
    }

    fn tag(&self) -> u8 {
        match self {
            SerializationFormat::Bincode => 0,
            SerializationFormat::BincodeLz4 => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SerializationFormat::Bincode),
            1 => Some(SerializationFormat::BincodeLz4),
            _ => None,
        }
    }
}

use crate::errors::LirError;
use serde::{de::DeserializeOwned, Serialize};

/// Leading bytes of every encoded buffer.
pub const MAGIC: &[u8; 4] = b"LIRT";
/// Bumped whenever the encoded layout changes.
pub const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Serialize data to bytes: header, then the bincode payload (LZ4-compressed if requested).
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, LirError> {
    let payload = bincode::serde::encode_to_vec(data, bincode::config::standard())
        .map_err(|e| LirError::SerializationFailed(e.to_string()))?;
    let payload = if format.is_compressed() {
        lz4_flex::compress_prepend_size(&payload)
    } else {
        payload
    };
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(VERSION);
    bytes.push(format.tag());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize data written by [`serialize`]. The format is read from the header.
pub fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, LirError> {
    if data.len() < HEADER_LEN || &data[..MAGIC.len()] != MAGIC {
        return Err(LirError::DeserializationFailed("missing LIRT header".to_string()));
    }
    if data[MAGIC.len()] != VERSION {
        return Err(LirError::DeserializationFailed(format!(
            "unsupported version {}",
            data[MAGIC.len()]
        )));
    }
    let format = SerializationFormat::from_tag(data[MAGIC.len() + 1]).ok_or_else(|| {
        LirError::DeserializationFailed(format!("unknown format tag {}", data[MAGIC.len() + 1]))
    })?;
    let body = &data[HEADER_LEN..];
    let (value, _) = if format.is_compressed() {
        let decompressed =
            lz4_flex::decompress_size_prepended(body).map_err(|_| LirError::LZ4DecompressionFailed)?;
        bincode::serde::decode_from_slice(&decompressed, bincode::config::standard())
    } else {
        bincode::serde::decode_from_slice(body, bincode::config::standard())
    }
    .map_err(|e| LirError::DeserializationFailed(e.to_string()))?;
    Ok(value)
}
