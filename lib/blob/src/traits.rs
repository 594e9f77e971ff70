use crate::error::BlobError;

/// BlobStore provides storage for uploaded files (ticket attachments).
///
/// Keys are path-like strings: `attachments/tkt001/report.pdf`. The default
/// implementation (`FileStore`) maps keys to local filesystem paths. Can be
/// swapped for S3/OSS backends by implementing this trait.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Check whether a blob exists.
    fn exists(&self, key: &str) -> Result<bool, BlobError>;

    /// Delete a blob. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Store an uploaded file under a namespace and return the stable stored
    /// filename callers should keep as the reference.
    ///
    /// The stored name is `{random}-{sanitized original name}` so repeated
    /// uploads of the same filename never clobber each other.
    fn store_upload(
        &self,
        namespace: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, BlobError> {
        let stored = stored_filename(original_name);
        self.put(&format!("{namespace}/{stored}"), data)?;
        Ok(stored)
    }
}

/// Build a collision-free stored filename from an upload's original name.
///
/// Path separators and parent references are stripped from the original name;
/// an empty result falls back to "file".
pub fn stored_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .replace("..", "");
    let base = if base.is_empty() { "file" } else { base.as_str() };
    let tag = &uuid::Uuid::new_v4().simple().to_string()[..8];
    format!("{tag}-{base}")
}
