//! File-backed key/value storage: one JSON object in `storage.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quicktoolify_core::store::{Storage, StorageError};

use crate::prelude::{println, *};

const STORAGE_FILE: &str = "storage.json";

/// Resolve the data directory: `--data-dir` wins, otherwise the platform data
/// dir plus `quicktoolify`.
pub fn data_dir(global: &crate::Global) -> Result<PathBuf> {
    match &global.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(dirs_next::data_dir()
            .ok_or_else(|| eyre!("Unable to determine data directory"))?
            .join("quicktoolify")),
    }
}

/// Open the storage file for the current invocation.
pub fn open(global: &crate::Global) -> Result<FileStorage> {
    let dir = data_dir(global)?;
    if global.verbose {
        println!("Data directory: {}", dir.display());
    }
    FileStorage::open(&dir).map_err(|e| eyre!(e))
}

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Load `storage.json` from `dir`, creating the directory if needed. A
    /// missing file is an empty store; an unreadable one is logged and
    /// treated as empty, so the next write replaces it.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)
            .map_err(|e| StorageError::Unavailable(format!("{}: {e}", dir.display())))?;

        let path = dir.join(STORAGE_FILE);
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable storage file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Read(format!("{}: {e}", path.display()))),
        };

        log::debug!("Loaded {} storage keys from {}", items.len(), path.display());
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.items)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StorageError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::Write(format!("{}: {e}", self.path.display())))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
