use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backend::KvBackend;
use crate::codec::Codec;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::reader::{BlockSummary, ChainReader};
use crate::record::Record;
use crate::writer::{ChainWriter, WriteSummary};

/// The record collection stored as one chain in a key-value backend.
///
/// Every operation rewrites or rereads the whole collection; cost is linear
/// in its compressed size.
///
/// # Concurrency
/// Appends through the same `ChainStore` are serialized by an internal async
/// mutex. Separate stores (or processes) writing the same base key still race:
/// the backend is last-write-wins and the losing append's record is dropped.
pub struct ChainStore {
    backend: Arc<dyn KvBackend>,
    codec: Arc<dyn Codec>,
    config: StoreConfig,
    write_lock: Mutex<()>,
}

impl ChainStore {
    pub fn new(
        backend: Arc<dyn KvBackend>,
        codec: Arc<dyn Codec>,
        config: StoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.max_value_size > backend.max_value_size() {
            return Err(StoreError::InvalidConfig(format!(
                "configured value size {} exceeds the backend limit {}",
                config.max_value_size,
                backend.max_value_size()
            )));
        }
        Ok(Self {
            backend,
            codec,
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    fn reader(&self) -> ChainReader<'_> {
        ChainReader::new(self.backend.as_ref(), self.codec.as_ref(), &self.config)
    }

    fn writer(&self) -> ChainWriter<'_> {
        ChainWriter::new(self.backend.as_ref(), self.codec.as_ref(), &self.config)
    }

    /// Append one record: read the full collection, push, rewrite it.
    ///
    /// Fails on an invalid record, on any write-path error, and on a stored
    /// chain that cannot be decoded (rather than replacing it).
    pub async fn append(&self, record: Record) -> Result<WriteSummary> {
        record
            .validate()
            .map_err(|reason| StoreError::InvalidRecord { index: 0, reason })?;

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.reader().read().await?;
        snapshot.records.push(record);
        self.writer()
            .write(&snapshot.records, snapshot.total_blocks)
            .await
    }

    /// Replace the whole collection.
    pub async fn write_all(&self, records: &[Record]) -> Result<WriteSummary> {
        let _guard = self.write_lock.lock().await;
        let previous = self.reader().fetch_block(0).await?;
        let previous_total = previous.and_then(|b| b.total_blocks);
        self.writer().write(records, previous_total).await
    }

    /// Read the full collection, reporting why when it cannot be read.
    pub async fn try_read_all(&self) -> Result<Vec<Record>> {
        Ok(self.reader().read().await?.records)
    }

    /// Read the full collection, or an empty one if anything goes wrong.
    ///
    /// The failure is logged, but callers cannot tell "no data yet" from "data
    /// present but unreadable". Use [`Self::try_read_all`] to tell them apart.
    pub async fn read_all(&self) -> Vec<Record> {
        match self.try_read_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    key = %self.config.base_key,
                    corruption = e.is_corruption(),
                    error = %e,
                    "failed to read record chain, returning empty collection"
                );
                Vec::new()
            }
        }
    }

    /// Reset the chain to a single empty block.
    ///
    /// Continuation keys of the previous chain are overwritten with the same
    /// empty descriptor rather than deleted. Returns how many keys were
    /// written; 0 when the base key was absent.
    pub async fn clear(&self) -> Result<u32> {
        let _guard = self.write_lock.lock().await;
        let previous_total = match self.reader().fetch_block(0).await {
            Ok(Some(base)) => base.total_blocks.unwrap_or(1).max(1),
            Ok(None) => return Ok(0),
            // An unparseable base block still gets reset.
            Err(e) if e.is_corruption() => {
                warn!(key = %self.config.base_key, error = %e, "clearing unreadable base block");
                1
            }
            Err(e) => return Err(e),
        };

        let written = self.writer().blank_range(0, previous_total).await?;
        info!(key = %self.config.base_key, previous_total, written, "cleared record chain");
        Ok(written)
    }

    /// Per-block metadata of the stored chain.
    pub async fn inspect(&self) -> Result<Vec<BlockSummary>> {
        self.reader().inspect().await
    }
}
