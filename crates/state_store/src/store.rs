use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::StateStoreError;
use crate::paths::temp_path_for;

/// Load/save primitive for one serialized state record.
pub trait StateStore: Send + Sync {
    /// Returns the last saved bytes, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StateStoreError>;

    /// Replaces the stored bytes.
    fn save(&self, bytes: &[u8]) -> Result<(), StateStoreError>;
}

/// Stores the record in a single file, replacing it atomically on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StateStoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StateStoreError::io("reading state file", &self.path, source)),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StateStoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                StateStoreError::io("creating state directory", parent, source)
            })?;
        }

        let temp_path = temp_path_for(&self.path);
        let mut file = File::create(&temp_path)
            .map_err(|source| StateStoreError::io("creating temp state file", &temp_path, source))?;
        file.write_all(bytes)
            .map_err(|source| StateStoreError::io("writing temp state file", &temp_path, source))?;
        file.sync_all()
            .map_err(|source| StateStoreError::io("syncing temp state file", &temp_path, source))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .map_err(|source| StateStoreError::io("replacing state file", &self.path, source))
    }
}
