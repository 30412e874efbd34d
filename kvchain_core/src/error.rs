use thiserror::Error;

use crate::backend::BackendError;

/// Every failure the store can report.
///
/// Write-path errors propagate to the caller of [`crate::ChainStore::append`]
/// and [`crate::ChainStore::clear`]. Read-path errors are returned by
/// [`crate::ChainStore::try_read_all`] and swallowed (logged) by
/// [`crate::ChainStore::read_all`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Decompression failed, or the decompressed bytes are not UTF-8.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Payload text contains characters outside the transcoder alphabet.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The chain ended (key absent) before a block with `hasNext = false`.
    #[error("missing continuation block {index} at key {key:?}")]
    MissingContinuationBlock { key: String, index: u32 },

    #[error("chain still continues after {limit} block fetches")]
    HopLimitExceeded { limit: u32 },

    /// A block's metadata contradicts its position in the chain.
    #[error("inconsistent block at key {key:?}: {reason}")]
    InconsistentBlock { key: String, reason: String },

    #[error("backend unavailable for key {key:?}: {source}")]
    BackendUnavailable {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("invalid record at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("block {index} is {size} bytes, over the {limit} byte value limit")]
    BlockTooLarge { index: u32, size: usize, limit: usize },

    /// The collection needs more blocks than a read is allowed to fetch.
    #[error("collection needs {blocks} blocks but reads stop after {limit}")]
    ChainTooLong { blocks: u32, limit: u32 },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn backend(key: &str, source: BackendError) -> Self {
        StoreError::BackendUnavailable {
            key: key.to_string(),
            source,
        }
    }

    /// Whether this error came from reading stored data that does not decode,
    /// as opposed to an unreachable backend or bad input.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::CorruptPayload(_)
                | StoreError::InvalidEncoding(_)
                | StoreError::MissingContinuationBlock { .. }
                | StoreError::HopLimitExceeded { .. }
                | StoreError::InconsistentBlock { .. }
                | StoreError::SerializationError(_)
                | StoreError::InvalidRecord { .. }
        )
    }
}
