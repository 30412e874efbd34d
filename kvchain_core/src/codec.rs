use crate::error::{Result, StoreError};

/// Core compression abstraction.
///
/// Each `Codec` implementation:
/// - Compresses the whole serialized collection in one call; there is no
///   per-block compression, the chain splits the already-compressed payload.
/// - Must reject malformed or truncated input on decompress rather than
///   return wrong bytes.
pub trait Codec: Send + Sync {
    /// Human-readable codec name for logs and CLI display.
    fn name(&self) -> &'static str;

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Compress a UTF-8 string.
pub fn compress_text(codec: &dyn Codec, text: &str) -> Result<Vec<u8>> {
    codec
        .compress(text.as_bytes())
        .map_err(|e| StoreError::CompressionFailed(format!("{} codec: {e:#}", codec.name())))
}

/// Decompress bytes produced by [`compress_text`] back into the original string.
pub fn decompress_text(codec: &dyn Codec, compressed: &[u8]) -> Result<String> {
    let raw = codec
        .decompress(compressed)
        .map_err(|e| StoreError::CorruptPayload(format!("{} codec: {e:#}", codec.name())))?;
    String::from_utf8(raw)
        .map_err(|e| StoreError::CorruptPayload(format!("decompressed payload is not UTF-8: {e}")))
}
