use tracing::{debug, info};

use crate::backend::KvBackend;
use crate::codec::{compress_text, Codec};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::format::{block_key, StorageBlock};
use crate::record::Record;
use crate::split::build_blocks;
use crate::transcode;

/// What a completed write left in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub total_blocks: u32,
    /// Length of the transcoded payload, in bytes.
    pub payload_len: usize,
    /// Stale continuation keys from a longer previous chain that were blanked.
    pub blanked: u32,
}

/// Serialize, compress, and transcode a collection into its stored payload.
pub fn encode_payload(codec: &dyn Codec, records: &[Record]) -> Result<String> {
    let serialized = serde_json::to_string(records)?;
    let compressed = compress_text(codec, &serialized)?;
    Ok(transcode::encode(&compressed))
}

/// Writes a whole collection as a chain of storage blocks.
///
/// # Write contract
/// 1. Serialize the collection to JSON, compress, base64-encode.
/// 2. Split the payload into blocks of at most `max_chunk_size` bytes.
/// 3. Put every continuation block, then the base block last. The base block
///    is what readers start from, so it is the commit point.
/// 4. Blank any continuation keys a longer previous chain left behind.
///
/// A collection needing more blocks than `max_hops` is rejected before any
/// put, since no reader would follow the whole chain.
///
/// A failed put aborts the write and is returned. Blocks already written stay
/// written; there is no rollback.
pub struct ChainWriter<'a> {
    backend: &'a dyn KvBackend,
    codec: &'a dyn Codec,
    config: &'a StoreConfig,
}

impl<'a> ChainWriter<'a> {
    pub fn new(backend: &'a dyn KvBackend, codec: &'a dyn Codec, config: &'a StoreConfig) -> Self {
        Self {
            backend,
            codec,
            config,
        }
    }

    /// Replace the stored collection with `records`.
    ///
    /// `previous_total` is the block count of the chain being replaced, when
    /// known; continuation keys at or past the new length are blanked.
    pub async fn write(
        &self,
        records: &[Record],
        previous_total: Option<u32>,
    ) -> Result<WriteSummary> {
        let payload = encode_payload(self.codec, records)?;
        let blocks = build_blocks(&payload, self.config.max_chunk_size());
        let total_blocks = blocks.len() as u32;
        if total_blocks > self.config.max_hops {
            return Err(StoreError::ChainTooLong {
                blocks: total_blocks,
                limit: self.config.max_hops,
            });
        }

        self.write_blocks(&blocks).await?;

        let blanked = match previous_total {
            Some(prev) if prev > total_blocks => self.blank_range(total_blocks, prev).await?,
            _ => 0,
        };

        info!(
            key = %self.config.base_key,
            records = records.len(),
            payload_len = payload.len(),
            total_blocks,
            blanked,
            "wrote record chain"
        );

        Ok(WriteSummary {
            total_blocks,
            payload_len: payload.len(),
            blanked,
        })
    }

    /// Put `blocks` under their keys, continuation blocks first.
    pub async fn write_blocks(&self, blocks: &[StorageBlock]) -> Result<()> {
        // Serialize everything up front so an oversized block fails before any put.
        let limit = self.config.max_value_size.min(self.backend.max_value_size());
        let mut encoded = Vec::with_capacity(blocks.len());
        for block in blocks {
            let json = block.to_json()?;
            if json.len() > limit {
                return Err(StoreError::BlockTooLarge {
                    index: block.block_index,
                    size: json.len(),
                    limit,
                });
            }
            encoded.push((block_key(&self.config.base_key, block.block_index), json));
        }

        if let Some((base, rest)) = encoded.split_first_mut() {
            for (key, json) in rest.iter_mut() {
                self.put(key, std::mem::take(json)).await?;
            }
            self.put(&base.0, std::mem::take(&mut base.1)).await?;
        }
        Ok(())
    }

    /// Overwrite keys `start..end` with the empty descriptor. Returns how many
    /// keys were written.
    pub async fn blank_range(&self, start: u32, end: u32) -> Result<u32> {
        let empty = StorageBlock::empty().to_json()?;
        for index in start..end {
            let key = block_key(&self.config.base_key, index);
            self.put(&key, empty.clone()).await?;
        }
        Ok(end.saturating_sub(start))
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        debug!(key, len = value.len(), "put block");
        self.backend
            .put(key, value)
            .await
            .map_err(|e| StoreError::backend(key, e))
    }
}
