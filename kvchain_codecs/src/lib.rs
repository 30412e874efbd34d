mod deflate_codec;
mod lz4_codec;
mod zstd_codec;

pub use deflate_codec::DeflateCodec;
pub use lz4_codec::Lz4Codec;
pub use zstd_codec::ZstdCodec;

use kvchain_core::Codec;
use std::sync::Arc;

/// Resolve a codec from its CLI name.
///
/// `level` applies to zstd (1–22) and deflate (0–9); lz4 ignores it.
pub fn codec_by_name(name: &str, level: Option<i32>) -> anyhow::Result<Arc<dyn Codec>> {
    match name {
        "zstd" | "z" => Ok(Arc::new(level.map_or_else(ZstdCodec::default, ZstdCodec::new))),
        "lz4" | "l" => Ok(Arc::new(Lz4Codec)),
        "deflate" | "zlib" | "d" => {
            let codec = match level {
                Some(l) => DeflateCodec::new(u32::try_from(l)?),
                None => DeflateCodec::default(),
            };
            Ok(Arc::new(codec))
        }
        other => anyhow::bail!("unknown codec '{}'. Valid options: zstd, lz4, deflate", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases() {
        assert_eq!(codec_by_name("z", None).unwrap().name(), "zstd");
        assert_eq!(codec_by_name("lz4", Some(9)).unwrap().name(), "lz4");
        assert_eq!(codec_by_name("zlib", Some(6)).unwrap().name(), "deflate");
        assert!(codec_by_name("brotli", None).is_err());
        assert!(codec_by_name("deflate", Some(-1)).is_err());
    }

    #[test]
    fn every_codec_round_trips_and_rejects_garbage() {
        let text = "name,surname,email\n".repeat(500);
        for name in ["zstd", "lz4", "deflate"] {
            let codec = codec_by_name(name, None).unwrap();
            let packed = codec.compress(text.as_bytes()).unwrap();
            assert!(packed.len() < text.len(), "{name} should shrink repetitive text");
            assert_eq!(codec.decompress(&packed).unwrap(), text.as_bytes());

            let truncated = &packed[..packed.len() / 2];
            assert!(codec.decompress(truncated).is_err(), "{name} accepted a truncated frame");
        }
    }

    #[test]
    fn deflate_rejects_trailing_bytes() {
        let codec = DeflateCodec::default();
        let mut packed = codec.compress(b"hello hello hello").unwrap();
        assert_eq!(codec.decompress(&packed).unwrap(), b"hello hello hello");

        packed.extend_from_slice(b"junk");
        let err = codec.decompress(&packed).unwrap_err();
        assert!(err.to_string().contains("trailing"), "got: {err}");
    }

    #[test]
    fn empty_input_round_trips() {
        for name in ["zstd", "lz4", "deflate"] {
            let codec = codec_by_name(name, None).unwrap();
            let packed = codec.compress(b"").unwrap();
            assert!(codec.decompress(&packed).unwrap().is_empty(), "{name}");
        }
    }
}
