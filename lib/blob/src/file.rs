use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BlobError;
use crate::traits::BlobStore;

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are mapped to paths under `base_dir`:
///   key "attachments/tkt001/a1b2c3d4-report.pdf" → `{base_dir}/attachments/tkt001/a1b2c3d4-report.pdf`
///
/// Parent directories are created automatically on `put`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that escape base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.starts_with('\\')
            || key.split(['/', '\\']).any(|part| part == "..")
        {
            return Err(BlobError::Io(format!("invalid blob key: {key:?}")));
        }
        Ok(self.base_dir.join(key))
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Some(data))
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.resolve(key)?;
        Ok(path.is_file())
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Io(e.to_string())),
        }
    }
}
