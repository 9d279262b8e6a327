use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;

use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::storage::blob::{Blob, BlobEntry, BlobStore, key_from_url, normalize_key, url_for};

const CONTENT_TYPE_SUFFIX: &str = ".content-type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// [`BlobStore`] backed by a directory tree.
///
/// Key `a/b` lives at `<root>/a/b` with its content type in `<root>/a/b.content-type`.
/// Blob writes go through a temporary file and a rename, so readers never see a
/// partially written blob.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
    tmp_seq: AtomicU64,
}

impl FsBlobStore {
    /// Create a store rooted at `root` whose blob URLs start with `base_url`.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix every blob URL starts with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut p = self.root.clone();
        p.extend(key.split('/'));
        p
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .with_context(|| format!("blob path '{}' has no parent", path.display()))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create blob dir '{}'", parent.display()))?;

        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = parent.join(format!(".tmp-{}-{seq}", std::process::id()));
        std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
        Ok(())
    }
}

fn sidecar(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(CONTENT_TYPE_SUFFIX);
    PathBuf::from(s)
}

fn storage_err(err: anyhow::Error) -> PhotoframeError {
    PhotoframeError::storage(format!("{err:#}"))
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> PhotoframeResult<BlobEntry> {
        let key = normalize_key(key)?;
        if key.ends_with(CONTENT_TYPE_SUFFIX) || key.split('/').any(|p| p.starts_with('.')) {
            return Err(PhotoframeError::bad_input(format!(
                "blob key '{key}' uses a reserved name"
            )));
        }
        let path = self.path_for(&key);
        self.write_atomic(&sidecar(&path), content_type.as_bytes())
            .map_err(storage_err)?;
        self.write_atomic(&path, bytes).map_err(storage_err)?;
        Ok(BlobEntry {
            url: url_for(&self.base_url, &key),
            key,
        })
    }

    fn list(&self, prefix: &str) -> PhotoframeResult<Vec<BlobEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).min_depth(1) {
            let entry = entry
                .with_context(|| format!("walk '{}'", self.root.display()))
                .map_err(storage_err)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.iter().any(|p| p.starts_with('.')) {
                continue;
            }
            let key = parts.join("/");
            if key.ends_with(CONTENT_TYPE_SUFFIX) || !key.starts_with(prefix) {
                continue;
            }
            out.push(BlobEntry {
                url: url_for(&self.base_url, &key),
                key,
            });
        }
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn delete(&self, url: &str) -> PhotoframeResult<()> {
        let key = key_from_url(&self.base_url, url)?;
        let path = self.path_for(&key);
        for p in [path.clone(), sidecar(&path)] {
            match std::fs::remove_file(&p) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(PhotoframeError::storage(format!(
                        "delete '{}': {e}",
                        p.display()
                    )));
                }
            }
        }
        Ok(())
    }

    fn fetch(&self, url: &str) -> PhotoframeResult<Blob> {
        let key = key_from_url(&self.base_url, url)?;
        let path = self.path_for(&key);
        let bytes = std::fs::read(&path)
            .map_err(|e| PhotoframeError::storage(format!("read '{}': {e}", path.display())))?;
        let content_type = std::fs::read_to_string(sidecar(&path))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string());
        Ok(Blob {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/fs.rs"]
mod tests;
