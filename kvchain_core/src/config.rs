use crate::error::{Result, StoreError};
use crate::format::{
    StorageBlock, DEFAULT_BASE_KEY, DEFAULT_MAX_HOPS, DEFAULT_MAX_VALUE_SIZE,
    DEFAULT_METADATA_OVERHEAD,
};

/// Layout of one chain in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key of block 0; continuation keys are derived from it.
    pub base_key: String,
    /// Largest value the backend accepts, in bytes.
    pub max_value_size: usize,
    /// Bytes of each value reserved for the JSON envelope around the chunk.
    pub metadata_overhead: usize,
    /// Upper bound on block fetches during one read, base block included.
    pub max_hops: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_key: DEFAULT_BASE_KEY.to_string(),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            metadata_overhead: DEFAULT_METADATA_OVERHEAD,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl StoreConfig {
    pub fn with_base_key(mut self, base_key: impl Into<String>) -> Self {
        self.base_key = base_key.into();
        self
    }

    pub fn with_max_value_size(mut self, max_value_size: usize) -> Self {
        self.max_value_size = max_value_size;
        self
    }

    /// Payload bytes carried by each block.
    pub fn max_chunk_size(&self) -> usize {
        self.max_value_size.saturating_sub(self.metadata_overhead)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_key.is_empty() {
            return Err(StoreError::InvalidConfig("base key is empty".into()));
        }
        if self.metadata_overhead >= self.max_value_size {
            return Err(StoreError::InvalidConfig(format!(
                "metadata overhead {} leaves no room in a {} byte value",
                self.metadata_overhead, self.max_value_size
            )));
        }
        let envelope = StorageBlock::max_envelope_len()?;
        if self.metadata_overhead < envelope {
            return Err(StoreError::InvalidConfig(format!(
                "metadata overhead {} cannot hold a {} byte block envelope",
                self.metadata_overhead, envelope
            )));
        }
        if self.max_hops == 0 {
            return Err(StoreError::InvalidConfig("hop limit must be at least 1".into()));
        }
        Ok(())
    }
}
