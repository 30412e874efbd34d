use tracing::{debug, warn};

use crate::backend::KvBackend;
use crate::codec::{decompress_text, Codec};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::format::{block_key, StorageBlock};
use crate::record::Record;
use crate::split::join_chunks;
use crate::transcode;

/// A collection as read back, with the length of the chain it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    /// Blocks in the chain read, `None` when the base key was absent.
    pub total_blocks: Option<u32>,
}

/// Metadata of one stored block, without its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub key: String,
    pub block_index: u32,
    pub has_next: bool,
    pub total_blocks: Option<u32>,
    pub data_len: usize,
}

/// Follows a chain of storage blocks and decodes it back into records.
///
/// # Read sequence
/// 1. Fetch the base block. Absent means an empty collection.
/// 2. While the last block has `hasNext`, fetch the next key, checking that
///    its `blockIndex` matches the key and its `totalBlocks` matches the chain.
///    At most `max_hops` blocks are fetched in total, so a cyclic or endlessly
///    continuing chain cannot loop forever.
/// 3. Join the chunks, base64-decode, decompress, parse, validate.
///
/// Every step reports a typed [`StoreError`]; nothing is swallowed here.
pub struct ChainReader<'a> {
    backend: &'a dyn KvBackend,
    codec: &'a dyn Codec,
    config: &'a StoreConfig,
}

impl<'a> ChainReader<'a> {
    pub fn new(backend: &'a dyn KvBackend, codec: &'a dyn Codec, config: &'a StoreConfig) -> Self {
        Self {
            backend,
            codec,
            config,
        }
    }

    /// Fetch and parse the block at chain position `index`.
    pub async fn fetch_block(&self, index: u32) -> Result<Option<StorageBlock>> {
        let key = block_key(&self.config.base_key, index);
        let raw = self
            .backend
            .get(&key)
            .await
            .map_err(|e| StoreError::backend(&key, e))?;
        debug!(key = %key, found = raw.is_some(), "fetch block");
        raw.map(|r| StorageBlock::from_json(&r)).transpose()
    }

    /// Walk the whole chain. `Ok(None)` when the base key is absent.
    pub async fn load_chain(&self) -> Result<Option<Vec<StorageBlock>>> {
        let Some(base) = self.fetch_block(0).await? else {
            return Ok(None);
        };
        base.check_position(&self.config.base_key, 0, None)?;
        let chain_total = base.total_blocks;

        let mut fetched = 1u32;
        let mut blocks = vec![base];
        while blocks.last().is_some_and(|b| b.has_next) {
            if fetched >= self.config.max_hops {
                warn!(key = %self.config.base_key, limit = self.config.max_hops, "hop limit reached");
                return Err(StoreError::HopLimitExceeded {
                    limit: self.config.max_hops,
                });
            }
            let index = blocks.len() as u32;
            let key = block_key(&self.config.base_key, index);
            fetched += 1;
            let Some(block) = self.fetch_block(index).await? else {
                warn!(key = %key, index, "chain breaks before its terminal block");
                return Err(StoreError::MissingContinuationBlock { key, index });
            };
            block.check_position(&key, index, chain_total)?;
            blocks.push(block);
        }

        let len = blocks.len() as u32;
        if let Some(total) = chain_total {
            if total != len {
                return Err(StoreError::InconsistentBlock {
                    key: self.config.base_key.clone(),
                    reason: format!("chain announced {total} blocks but has {len}"),
                });
            }
        }
        Ok(Some(blocks))
    }

    /// Read and decode the full collection.
    pub async fn read(&self) -> Result<Snapshot> {
        let Some(blocks) = self.load_chain().await? else {
            return Ok(Snapshot::default());
        };
        let total_blocks = Some(blocks.len() as u32);
        let payload = join_chunks(blocks.iter().map(|b| b.data.as_str()));
        let records = decode_payload(self.codec, &payload)?;
        Ok(Snapshot {
            records,
            total_blocks,
        })
    }

    /// Summaries of every block in the chain, without decoding the payload.
    pub async fn inspect(&self) -> Result<Vec<BlockSummary>> {
        let blocks = self.load_chain().await?.unwrap_or_default();
        Ok(blocks
            .into_iter()
            .map(|b| BlockSummary {
                key: block_key(&self.config.base_key, b.block_index),
                block_index: b.block_index,
                has_next: b.has_next,
                total_blocks: b.total_blocks,
                data_len: b.data.len(),
            })
            .collect())
    }
}

/// Reverse of [`crate::writer::encode_payload`].
///
/// An empty payload is the cleared state and decodes to no records.
pub fn decode_payload(codec: &dyn Codec, payload: &str) -> Result<Vec<Record>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let compressed = transcode::decode(payload)?;
    let serialized = decompress_text(codec, &compressed)?;
    let records: Vec<Record> = serde_json::from_str(&serialized)?;
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|reason| StoreError::InvalidRecord { index, reason })?;
    }
    Ok(records)
}
