use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use crate::layers::Corpus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no corpus found at {0}")]
    NotFound(PathBuf),
    #[error("corpus at {path} is not well-formed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize corpus: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The corpus file. Writes replace the whole file; readers never see a partial one.
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, corpus: &Corpus) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(corpus).map_err(StoreError::Serialize)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|e| self.io_error(dir, e))?;
        }

        // Write beside the target, then rename over it
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json.as_bytes()).await.map_err(|e| self.io_error(&staging, e))?;
        if let Err(e) = fs::rename(&staging, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                tracing::warn!("Could not remove staging file {:?}: {}", staging, cleanup);
            }
            return Err(self.io_error(&self.path, e));
        }

        tracing::info!("Saved corpus with {} papers to {:?}", corpus.paper_count(), self.path);
        Ok(())
    }

    pub async fn load(&self) -> Result<Corpus, StoreError> {
        let text = fs::read_to_string(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(self.path.clone()),
            _ => self.io_error(&self.path, e),
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}
