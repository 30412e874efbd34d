use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, StoreError};

/// Map compressed bytes to the text-safe payload stored in block `data`.
///
/// Standard base64 with padding: the output is pure ASCII and needs no JSON
/// escaping, so payload length equals the stored byte count.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| StoreError::InvalidEncoding(e.to_string()))
}
