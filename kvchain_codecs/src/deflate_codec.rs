use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use kvchain_core::Codec;

/// Deflate codec with zlib framing.
///
/// Decoding only succeeds when the input ends exactly at the zlib stream end
/// (and its Adler-32 trailer): truncated input or trailing bytes are errors
/// rather than short or silently accepted output.
pub struct DeflateCodec {
    /// Compression level, 0 (store) to 9 (best).
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut inflater = Decompress::new(true);
        let mut raw = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));
        loop {
            if raw.len() == raw.capacity() {
                raw.reserve(raw.capacity());
            }
            let (in_before, out_before) = (inflater.total_in(), inflater.total_out());
            let consumed = in_before as usize;
            let status =
                inflater.decompress_vec(&compressed[consumed..], &mut raw, FlushDecompress::None)?;
            if status == Status::StreamEnd {
                let used = inflater.total_in() as usize;
                if used < compressed.len() {
                    anyhow::bail!(
                        "{} trailing bytes after zlib stream end",
                        compressed.len() - used
                    );
                }
                return Ok(raw);
            }
            let stalled = inflater.total_in() == in_before && inflater.total_out() == out_before;
            if stalled && raw.len() < raw.capacity() {
                anyhow::bail!(
                    "zlib stream ends early after {} of {} input bytes",
                    inflater.total_in(),
                    compressed.len()
                );
            }
        }
    }
}
