use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::utils::error::{PresetError, PresetResult};

const STORAGE_FILE_EXTENSION: &str = "json";

pub trait StoragePort {
    fn get(&self, key: &str) -> PresetResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PresetResult<()>;
    fn remove(&self, key: &str) -> PresetResult<()>;
    fn keys(&self) -> PresetResult<Vec<String>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> PresetResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PresetResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PresetResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> PresetResult<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

fn storage_error(key: &str, message: impl Into<String>) -> PresetError {
    PresetError::Storage {
        key: key.to_string(),
        message: message.into(),
    }
}

fn validate_key(key: &str) -> PresetResult<()> {
    // パス区切りや相対参照を含むキーはディレクトリ外へ出られるため拒否する。
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(storage_error(key, "key must match [A-Za-z0-9_-]+"));
    }
    Ok(())
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PresetResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{STORAGE_FILE_EXTENSION}")))
    }
}

impl StoragePort for FileStorage {
    fn get(&self, key: &str) -> PresetResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(storage_error(
                key,
                format!("Failed to read '{}': {error}", path.display()),
            )),
        }
    }

    fn set(&self, key: &str, value: &str) -> PresetResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| {
            storage_error(
                key,
                format!("Failed to create storage directory '{}': {e}", self.root.display()),
            )
        })?;
        fs::write(&path, value)
            .map_err(|e| storage_error(key, format!("Failed to write '{}': {e}", path.display())))?;
        log::debug!("wrote storage key {key} ({} bytes)", value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> PresetResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(storage_error(
                key,
                format!("Failed to remove '{}': {error}", path.display()),
            )),
        }
    }

    fn keys(&self) -> PresetResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| {
            storage_error(
                "*",
                format!("Failed to read storage directory '{}': {e}", self.root.display()),
            )
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| storage_error("*", format!("Failed to read entry: {e}")))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_storage_file = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == STORAGE_FILE_EXTENSION);
            if !is_storage_file {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "tab-settings-storage-{label}-{}-{}",
            std::process::id(),
            rand::random::<u64>()
        ))
    }

    #[test]
    fn memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set("clock_presets", "[]").expect("set");
        assert_eq!(handle.get("clock_presets").expect("get").as_deref(), Some("[]"));
        assert_eq!(handle.keys().expect("keys"), vec!["clock_presets".to_string()]);
    }

    #[test]
    fn file_storage_round_trip_and_missing_key() {
        let dir = temp_storage_dir("round-trip");
        let storage = FileStorage::new(&dir);

        assert_eq!(storage.get("clock_presets").expect("get"), None);
        assert!(storage.keys().expect("keys").is_empty());

        storage.set("clock_presets", "[]").expect("set");
        assert_eq!(storage.get("clock_presets").expect("get").as_deref(), Some("[]"));
        assert_eq!(storage.keys().expect("keys"), vec!["clock_presets".to_string()]);

        storage.remove("clock_presets").expect("remove");
        storage.remove("clock_presets").expect("remove twice");
        assert_eq!(storage.get("clock_presets").expect("get"), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let storage = FileStorage::new(temp_storage_dir("keys"));
        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("a/b").is_err());
    }
}
