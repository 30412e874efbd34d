use kvchain_core::Codec;

/// Zstandard codec.
///
/// The whole serialized collection is compressed as one frame at the
/// configured level (default: 3). The frame records its content size, so
/// decompression needs no size hint.
///
/// Best for: JSON collections of free text, the default.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let compressed = zstd::bulk::compress(raw, self.level)?;
        Ok(compressed)
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        let raw = zstd::decode_all(compressed)?;
        Ok(raw)
    }
}
