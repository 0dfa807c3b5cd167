use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{
    error::{Result, VeoError},
    storage::traits::KeyValueStore,
};
use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 contents count as a readable but corrupted entry.
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(VeoError::StorageError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            VeoError::StorageError(format!(
                "Failed to create settings directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.entry_path(key);
        // Unique per write so overlapping saves never share a temp file.
        let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp_path, value).await.map_err(|e| {
            VeoError::StorageError(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &path).await.map_err(|e| {
            VeoError::StorageError(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VeoError::StorageError(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("nested").join("settings"));

        store.set("veo-generation-settings", "{}").await.unwrap();
        assert_eq!(
            store.get("veo-generation-settings").await.unwrap().as_deref(),
            Some("{}")
        );
        assert!(store
            .dir()
            .join("veo-generation-settings.json")
            .exists());
        assert_eq!(entries(store.dir()), vec!["veo-generation-settings.json"]);
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_overlapping_writes_all_succeed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(tmp.path()));
        let values: Vec<String> = (0..16).map(|i| format!("{{\"n\": {}}}", i)).collect();

        let writes = values.iter().map(|value| {
            let store = store.clone();
            let value = value.clone();
            tokio::spawn(async move { store.set("settings", &value).await })
        });
        for result in futures::future::join_all(writes).await {
            assert!(result.unwrap().is_ok());
        }

        let stored = store.get("settings").await.unwrap().unwrap();
        assert!(values.contains(&stored));
        assert_eq!(entries(tmp.path()), vec!["settings.json"]);
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        assert_eq!(store.get("absent").await.unwrap(), None);
        assert!(store.remove("absent").await.is_ok());
    }

    #[test]
    fn test_key_is_sanitized() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(
            store.entry_path("../evil key"),
            PathBuf::from("/tmp/x/___evil_key.json")
        );
    }
}
