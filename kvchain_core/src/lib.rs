pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod reader;
pub mod record;
pub mod split;
pub mod store;
pub mod transcode;
pub mod writer;

pub use backend::{BackendError, KvBackend, MemoryBackend};
pub use codec::Codec;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use format::{block_key, StorageBlock};
pub use reader::{BlockSummary, ChainReader, Snapshot};
pub use record::Record;
pub use store::ChainStore;
pub use writer::{ChainWriter, WriteSummary};
