//! Loading promotion sources into the store
//!
//! Every load parses the complete source before the store is touched. A
//! source that fails to parse leaves both the store and the file on disk as
//! they were.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::encoding::Dataset;
use crate::error::{Error, Result};
use crate::protocol::Parser;
use crate::store::Store;

/// Suffix of the file an upload is written to before it replaces the source
const STAGING_SUFFIX: &str = ".upload";

pub struct Loader {
    store: Arc<Store>,
    source: PathBuf,
    /// Held for the whole of a load so only one runs at a time
    reload_lock: Mutex<()>,
}

impl Loader {
    pub fn new(store: Arc<Store>, source: impl Into<PathBuf>) -> Self {
        Self {
            store,
            source: source.into(),
            reload_lock: Mutex::new(()),
        }
    }

    /// Path of the source file
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Read the source file and install its records.
    ///
    /// Returns the number of records now being served.
    pub async fn reload(&self) -> Result<usize> {
        let _guard = self.reload_lock.lock().await;

        let contents = tokio::fs::read(&self.source)
            .await
            .map_err(|source| Error::SourceUnavailable {
                path: self.source.clone(),
                source,
            })?;
        debug!(path = %self.source.display(), bytes = contents.len(), "read promotion source");

        let dataset = Parser::parse(contents.as_slice())?;
        Ok(self.install_dataset(dataset))
    }

    /// Install an uploaded source.
    ///
    /// The contents are parsed first, then persisted over the source file, and
    /// only then served. Returns the number of records now being served.
    pub async fn install(&self, contents: Bytes) -> Result<usize> {
        let _guard = self.reload_lock.lock().await;

        let dataset = Parser::parse(&contents[..])?;
        self.persist(&contents).await?;
        Ok(self.install_dataset(dataset))
    }

    /// Write `contents` next to the source, then rename it into place
    async fn persist(&self, contents: &[u8]) -> Result<()> {
        if let Some(parent) = self.source.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(persist_error(parent))?;
        }

        let staging = staging_path(&self.source);
        tokio::fs::write(&staging, contents)
            .await
            .map_err(persist_error(&staging))?;

        if let Err(e) = tokio::fs::rename(&staging, &self.source).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(persist_error(&self.source)(e));
        }

        debug!(path = %self.source.display(), bytes = contents.len(), "persisted promotion source");
        Ok(())
    }

    fn install_dataset(&self, dataset: Dataset) -> usize {
        let records = dataset.len();
        self.store.replace(dataset);
        info!(path = %self.source.display(), records, "installed promotion dataset");
        records
    }
}

fn persist_error(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::Persist { path, source }
}

fn staging_path(source: &Path) -> PathBuf {
    let mut name = OsString::from(source.as_os_str());
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}
