use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::storage::blob::{Blob, BlobEntry, BlobStore, key_from_url, normalize_key, url_for};

/// Base URL used for blobs held by [`MemoryBlobStore`].
pub const MEMORY_BASE_URL: &str = "memory://blobs";

/// Ephemeral in-process [`BlobStore`], ordered by key.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Blob>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> PhotoframeResult<MutexGuard<'_, BTreeMap<String, Blob>>> {
        self.blobs
            .lock()
            .map_err(|_| PhotoframeError::storage("memory store lock poisoned"))
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> PhotoframeResult<BlobEntry> {
        let key = normalize_key(key)?;
        self.lock()?.insert(
            key.clone(),
            Blob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(BlobEntry {
            url: url_for(MEMORY_BASE_URL, &key),
            key,
        })
    }

    fn list(&self, prefix: &str) -> PhotoframeResult<Vec<BlobEntry>> {
        let blobs = self.lock()?;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| BlobEntry {
                key: k.clone(),
                url: url_for(MEMORY_BASE_URL, k),
            })
            .collect())
    }

    fn delete(&self, url: &str) -> PhotoframeResult<()> {
        let key = key_from_url(MEMORY_BASE_URL, url)?;
        self.lock()?.remove(&key);
        Ok(())
    }

    fn fetch(&self, url: &str) -> PhotoframeResult<Blob> {
        let key = key_from_url(MEMORY_BASE_URL, url)?;
        self.lock()?
            .get(&key)
            .cloned()
            .ok_or_else(|| PhotoframeError::storage(format!("blob '{key}' not found")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/memory.rs"]
mod tests;
