use super::KeyValueBackend;
use crate::core::{Result, StoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// One file per key under a root directory.
///
/// Writes go to a uniquely named temp file that is renamed over the target,
/// so a reader never sees a half-written value and overlapping writes never
/// share a temp file.
pub struct FileBackend {
    root: PathBuf,
    extension: &'static str,
}

impl FileBackend {
    /// Opens (creating if needed) the backend directory.
    pub fn open<P: AsRef<Path>>(root: P, extension: &'static str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            StoreError::Storage(format!(
                "Failed to create storage directory '{}': {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root, extension })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, self.extension))
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(format!(
                "Failed to read '{}': {}",
                path.display(),
                err
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        atomic_write(&self.path_for(key), &value).await
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|err| {
            StoreError::Io(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp, bytes).await.map_err(|err| {
        StoreError::Io(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::Io(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("nested"), "json").unwrap();
        assert!(backend.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path(), "json").unwrap();

        backend.set("state", b"first".to_vec()).await.unwrap();
        backend.set("state", b"second".to_vec()).await.unwrap();

        assert_eq!(backend.get("state").await.unwrap(), Some(b"second".to_vec()));
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }
}
