use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// One stored object as returned by [`BlobStore::list`] and [`BlobStore::put`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BlobEntry {
    /// Normalized store key, e.g. `settings/background_00000001700000000000`.
    pub key: String,
    /// Public URL the blob can be fetched from.
    pub url: String,
}

/// Blob payload returned by [`BlobStore::fetch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Content type recorded at `put` time.
    pub content_type: String,
}

/// Key-value blob store with prefix listing.
///
/// No transactions and no multi-key atomicity: callers that replace records
/// write the new key first and delete the old ones afterwards.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any blob with the same key.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> PhotoframeResult<BlobEntry>;

    /// List every blob whose key starts with `prefix`, ordered by key.
    fn list(&self, prefix: &str) -> PhotoframeResult<Vec<BlobEntry>>;

    /// Delete the blob at `url`. Deleting an absent blob succeeds.
    fn delete(&self, url: &str) -> PhotoframeResult<()>;

    /// Fetch the blob at `url`.
    fn fetch(&self, url: &str) -> PhotoframeResult<Blob>;
}

/// Normalize a store key to a relative, slash-separated path without `.`/`..` segments.
pub fn normalize_key(key: &str) -> PhotoframeResult<String> {
    let s = key.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PhotoframeError::bad_input("blob keys must be relative"));
    }
    if s.is_empty() {
        return Err(PhotoframeError::bad_input("blob key must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PhotoframeError::bad_input("blob keys must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PhotoframeError::bad_input("blob key must contain a name"));
    }

    Ok(out.join("/"))
}

/// Join a base URL and a key into the public URL of a blob.
pub(crate) fn url_for(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// Recover the key from a URL produced by [`url_for`] with the same base.
pub(crate) fn key_from_url(base: &str, url: &str) -> PhotoframeResult<String> {
    let base = base.trim_end_matches('/');
    let rest = url
        .strip_prefix(base)
        .and_then(|r| r.strip_prefix('/'))
        .ok_or_else(|| PhotoframeError::bad_input(format!("url '{url}' is not served by this store")))?;
    normalize_key(rest)
}

#[cfg(test)]
#[path = "../../tests/unit/storage/blob.rs"]
mod tests;
