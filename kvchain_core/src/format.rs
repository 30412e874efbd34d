use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Default per-value ceiling of the deployed backend: 24 MiB.
pub const DEFAULT_MAX_VALUE_SIZE: usize = 24 * 1024 * 1024;

/// Bytes of every value reserved for the block's own JSON envelope.
pub const DEFAULT_METADATA_OVERHEAD: usize = 1024;

/// Maximum payload characters per block with the default limits:
///   24 MiB - 1 KiB = 25_164_800
pub const DEFAULT_MAX_CHUNK_SIZE: usize = DEFAULT_MAX_VALUE_SIZE - DEFAULT_METADATA_OVERHEAD;

/// Upper bound on block fetches during one chain walk, base block included.
pub const DEFAULT_MAX_HOPS: u32 = 100;

pub const DEFAULT_BASE_KEY: &str = "contact_submissions";

/// Key of block `index` in the chain rooted at `base`.
///
/// Block 0 lives at the base key itself; continuation block `i` lives at
/// `base_i`.
pub fn block_key(base: &str, index: u32) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}_{index}")
    }
}

// ── Storage block ───────────────────────────────────────────────────────────

/// One stored value: a chunk of the payload plus forward-link metadata.
///
/// Serialized as JSON with camelCase keys:
/// ```text
/// {"data":"<base64 chunk>","hasNext":true,"blockIndex":0,"totalBlocks":2}
/// ```
/// `totalBlocks` is omitted when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBlock {
    pub data: String,
    pub has_next: bool,
    pub block_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_blocks: Option<u32>,
}

impl StorageBlock {
    /// The inert descriptor written by `clear`: no data, terminal, one block.
    pub fn empty() -> Self {
        Self {
            data: String::new(),
            has_next: false,
            block_index: 0,
            total_blocks: Some(1),
        }
    }

    /// Serialized size of the largest possible envelope around an empty chunk.
    pub fn max_envelope_len() -> Result<usize> {
        let widest = Self {
            data: String::new(),
            has_next: true,
            block_index: u32::MAX,
            total_blocks: Some(u32::MAX),
        };
        Ok(widest.to_json()?.len())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check that this block may sit at chain position `expected` of a chain
    /// that announced `chain_total` blocks.
    pub(crate) fn check_position(
        &self,
        key: &str,
        expected: u32,
        chain_total: Option<u32>,
    ) -> Result<()> {
        if self.block_index != expected {
            return Err(StoreError::InconsistentBlock {
                key: key.to_string(),
                reason: format!(
                    "blockIndex is {} but the key addresses block {}",
                    self.block_index, expected
                ),
            });
        }
        if let (Some(total), Some(ours)) = (chain_total, self.total_blocks) {
            if total != ours {
                return Err(StoreError::InconsistentBlock {
                    key: key.to_string(),
                    reason: format!("totalBlocks is {ours} but the chain announced {total}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_naming() {
        assert_eq!(block_key("inbox", 0), "inbox");
        assert_eq!(block_key("inbox", 1), "inbox_1");
        assert_eq!(block_key("inbox", 12), "inbox_12");
    }

    #[test]
    fn default_chunk_size() {
        assert_eq!(DEFAULT_MAX_CHUNK_SIZE, 25_164_800);
    }

    #[test]
    fn json_envelope_uses_camel_case() {
        let block = StorageBlock {
            data: "QUJD".into(),
            has_next: true,
            block_index: 0,
            total_blocks: Some(2),
        };
        let json = block.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"data":"QUJD","hasNext":true,"blockIndex":0,"totalBlocks":2}"#
        );
        assert_eq!(StorageBlock::from_json(&json).unwrap(), block);
    }

    #[test]
    fn total_blocks_is_optional_on_read() {
        let block =
            StorageBlock::from_json(r#"{"data":"","hasNext":false,"blockIndex":0}"#).unwrap();
        assert_eq!(block.total_blocks, None);
        assert!(!block.to_json().unwrap().contains("totalBlocks"));
    }

    #[test]
    fn widest_envelope() {
        let expected = r#"{"data":"","hasNext":true,"blockIndex":4294967295,"totalBlocks":4294967295}"#;
        assert_eq!(StorageBlock::max_envelope_len().unwrap(), expected.len());
    }

    #[test]
    fn position_check_catches_misplaced_blocks() {
        let mut block = StorageBlock::empty();
        block.block_index = 2;
        assert!(block.check_position("k_3", 3, None).is_err());
        assert!(block.check_position("k_2", 2, Some(4)).is_err());
        assert!(block.check_position("k_2", 2, Some(1)).is_ok());
        block.total_blocks = None;
        assert!(block.check_position("k_2", 2, Some(4)).is_ok());
    }
}
