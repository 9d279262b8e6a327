use std::sync::Arc;

use super::*;
use crate::storage::blob::{Blob, BlobEntry};
use crate::storage::memory::MemoryBlobStore;
use crate::test_support::{NoDeleteStore, UnreachableStore, solid_jpeg, solid_png};

#[test]
fn second_upload_replaces_first() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let store = TemplateAssetStore::new(blobs.clone());

    let a = solid_png(4, 4, [255, 0, 0, 255]);
    let b = solid_png(4, 4, [0, 0, 255, 255]);
    let url_a = store.upload(TemplateRole::Background, &a).unwrap();
    let url_b = store.upload(TemplateRole::Background, &b).unwrap();
    assert_ne!(url_a, url_b);

    let current = store.current(TemplateRole::Background).unwrap();
    assert_eq!(current.url, url_b);
    assert_eq!(blobs.fetch(&current.url).unwrap().bytes, b);
    assert!(blobs.fetch(&url_a).is_err());
    assert_eq!(blobs.len(), 1);
}

#[test]
fn roles_are_independent() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let store = TemplateAssetStore::new(blobs.clone());

    store
        .upload(TemplateRole::Background, &solid_jpeg(4, 4, [1, 2, 3]))
        .unwrap();
    assert!(store.current(TemplateRole::Overlay).is_none());
    let overlay_url = store
        .upload(TemplateRole::Overlay, &solid_png(4, 4, [0, 0, 0, 0]))
        .unwrap();

    let bg = store.current(TemplateRole::Background).unwrap();
    assert_eq!(bg.role, TemplateRole::Background);
    assert!(bg.key.starts_with("settings/background_"));
    assert_eq!(blobs.fetch(&bg.url).unwrap().content_type, "image/jpeg");
    assert_eq!(
        store.current(TemplateRole::Overlay).unwrap().url,
        overlay_url
    );
}

#[test]
fn non_image_upload_is_rejected_without_mutation() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let store = TemplateAssetStore::new(blobs.clone());
    let err = store
        .upload(TemplateRole::Overlay, b"<html>not an image</html>")
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::BadInput(_)));
    assert!(blobs.is_empty());
}

#[test]
fn upload_removes_legacy_role_blobs() {
    let blobs = Arc::new(MemoryBlobStore::new());
    blobs
        .put("settings/overlay_1736900000000", b"old", "image/png")
        .unwrap();
    let store = TemplateAssetStore::new(blobs.clone());

    let url = store
        .upload(TemplateRole::Overlay, &solid_png(2, 2, [9, 9, 9, 255]))
        .unwrap();
    let keys: Vec<_> = blobs
        .list("settings/")
        .unwrap()
        .into_iter()
        .map(|e| e.url)
        .collect();
    assert_eq!(keys, vec![url]);
}

#[test]
fn interrupted_replace_keeps_newest_visible() {
    let blobs = Arc::new(NoDeleteStore::default());
    let store = TemplateAssetStore::new(blobs.clone());

    store
        .upload(TemplateRole::Background, &solid_png(2, 2, [1, 1, 1, 255]))
        .unwrap();
    let newest = store
        .upload(TemplateRole::Background, &solid_png(2, 2, [2, 2, 2, 255]))
        .unwrap();
    assert_eq!(blobs.inner.len(), 2);
    assert_eq!(store.current(TemplateRole::Background).unwrap().url, newest);
}

/// Memory store where a second uploader lands a newer version right after every write.
#[derive(Default)]
struct RacingStore {
    inner: MemoryBlobStore,
}

const RIVAL_KEY: &str = "settings/background_18446744073709551615";

impl BlobStore for RacingStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> PhotoframeResult<BlobEntry> {
        let entry = self.inner.put(key, bytes, content_type)?;
        if key != RIVAL_KEY {
            self.inner.put(RIVAL_KEY, b"rival", "image/png")?;
        }
        Ok(entry)
    }

    fn list(&self, prefix: &str) -> PhotoframeResult<Vec<BlobEntry>> {
        self.inner.list(prefix)
    }

    fn delete(&self, url: &str) -> PhotoframeResult<()> {
        self.inner.delete(url)
    }

    fn fetch(&self, url: &str) -> PhotoframeResult<Blob> {
        self.inner.fetch(url)
    }
}

#[test]
fn concurrent_newer_upload_survives_cleanup() {
    let blobs = Arc::new(RacingStore::default());
    let store = TemplateAssetStore::new(blobs.clone());

    let ours = store
        .upload(TemplateRole::Background, &solid_png(2, 2, [3, 3, 3, 255]))
        .unwrap();

    let current = store.current(TemplateRole::Background).unwrap();
    assert_eq!(current.key, RIVAL_KEY);
    assert_eq!(blobs.fetch(&current.url).unwrap().bytes, b"rival");
    assert_ne!(current.url, ours);
}

#[test]
fn unreachable_store_reads_none_and_fails_writes() {
    let store = TemplateAssetStore::new(Arc::new(UnreachableStore));
    assert!(store.current(TemplateRole::Background).is_none());
    let err = store
        .upload(TemplateRole::Background, &solid_png(2, 2, [0, 0, 0, 255]))
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::Storage(_)));
}
