use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use super::{Settings, Storage};
use crate::error::StorageError;

/// Settings persisted to a JSON file.
///
/// Loading merges the file over the defaults; a missing, unreadable or
/// non-object file leaves the defaults in place. Every change is written back
/// immediately. Write failures are logged and otherwise ignored, the in-memory
/// value stays authoritative until the next successful write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    settings: Settings,
}

impl FileStorage {
    /// Open the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut settings = Settings::default();
        match read(&path) {
            Ok(loaded) => {
                if let Err(error) = settings.merge(loaded) {
                    tracing::warn!(path = %path.display(), %error, "ignoring settings file");
                }
            },
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "using default settings");
            },
        }
        Self { path, settings }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec(&self.settings.to_value())?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }
}

fn read(path: &Path) -> Result<Value, StorageError> {
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

impl Storage for FileStorage {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn update(&mut self, change: &mut dyn FnMut(&mut Settings)) {
        change(&mut self.settings);
        if let Err(error) = self.save() {
            tracing::error!(path = %self.path.display(), %error, "failed to persist settings");
        }
    }

    fn wipe(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), %error, "nothing to wipe");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::keys;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("config.json"));
        assert_eq!(storage.settings(), &Settings::default());
    }

    #[test]
    fn changes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut storage = FileStorage::open(&path);
        storage.set(keys::NAME, json!("Trooper"));
        storage.set_app_setting("name.font", json!("large"));

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get_str(keys::NAME), Some("Trooper"));
        assert_eq!(reopened.app_setting("name", "name.font"), Some(&json!("large")));
        assert_eq!(reopened.get(keys::OTA), Some(&json!(true)));
    }

    #[test]
    fn corrupt_or_non_object_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, b"{not json").unwrap();
        assert_eq!(FileStorage::open(&path).settings(), &Settings::default());

        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert_eq!(FileStorage::open(&path).settings(), &Settings::default());
    }

    #[test]
    fn wipe_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut storage = FileStorage::open(&path);
        storage.set(keys::RESTART, json!(true));
        assert!(path.exists());

        storage.wipe();
        assert!(!path.exists());
        assert!(!FileStorage::open(&path).flag(keys::RESTART));
    }
}
