use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kvchain_core::format::DEFAULT_MAX_VALUE_SIZE;
use kvchain_core::{BackendError, KvBackend};

/// Backend that stores each key as a file `<dir>/<key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crashed put never leaves a half-written value behind.
pub struct FsBackend {
    dir: PathBuf,
    max_value_size: usize,
}

impl FsBackend {
    pub async fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        })
    }

    pub fn with_max_value_size(mut self, max_value_size: usize) -> Self {
        self.max_value_size = max_value_size;
        self
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BackendError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(BackendError::Unavailable(format!(
                "key {key:?} is not a safe file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> BackendError {
    BackendError::Unavailable(format!("{}: {e}", path.display()))
}

#[async_trait]
impl KvBackend for FsBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), BackendError> {
        if value.len() > self.max_value_size {
            return Err(BackendError::ValueTooLarge {
                key: key.to_string(),
                size: value.len(),
                limit: self.max_value_size,
            });
        }
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&path, e));
        }
        Ok(())
    }

    fn max_value_size(&self) -> usize {
        self.max_value_size
    }
}
