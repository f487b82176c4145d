use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use crate::codec;
use crate::domain::DrawStore;
use crate::error::LottoError;

/// The persisted data file. Reads are forgiving — anything unusable falls
/// back to an empty store — and writes go through a sibling temp file plus
/// rename, so a failed write never truncates the previous history.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: Utf8PathBuf,
}

impl DataFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.as_std_path().exists()
    }

    /// Loads the store. A missing, unreadable, or corrupt file yields an
    /// empty store (logged), which makes the next crawl start from round 1.
    pub fn load(&self) -> DrawStore {
        if !self.exists() {
            info!(path = %self.path, "no data file yet, starting empty");
            return DrawStore::default();
        }
        match fs::read_to_string(self.path.as_std_path()) {
            Ok(content) => codec::decode(&content),
            Err(err) => {
                warn!(path = %self.path, %err, "could not read data file, starting empty");
                DrawStore::default()
            }
        }
    }

    /// Encodes the store and replaces the data file atomically.
    pub fn save(&self, store: &DrawStore) -> Result<(), LottoError> {
        let content = codec::encode(store);

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => {
                fs::create_dir_all(parent.as_std_path())
                    .map_err(|err| LottoError::Filesystem(err.to_string()))?;
                parent
            }
            _ => Utf8Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".lotto-sync")
            .suffix(".tmp")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| LottoError::Filesystem(err.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| LottoError::Filesystem(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| LottoError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
