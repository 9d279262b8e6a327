use std::sync::Arc;

use super::*;
use crate::assets::templates::TemplateAssetStore;
use crate::config::layout_store::LayoutConfigStore;
use crate::storage::blob::{Blob, BlobEntry};
use crate::storage::memory::MemoryBlobStore;
use crate::test_support::{UnreachableStore, solid_png};
use crate::{PhotoframeError, PhotoframeResult};

/// Lists normally but cannot fetch anything.
struct ListOnlyStore(MemoryBlobStore);

impl BlobStore for ListOnlyStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> PhotoframeResult<BlobEntry> {
        self.0.put(key, bytes, content_type)
    }

    fn list(&self, prefix: &str) -> PhotoframeResult<Vec<BlobEntry>> {
        self.0.list(prefix)
    }

    fn delete(&self, url: &str) -> PhotoframeResult<()> {
        self.0.delete(url)
    }

    fn fetch(&self, _url: &str) -> PhotoframeResult<Blob> {
        Err(PhotoframeError::storage("fetch timed out"))
    }
}

#[test]
fn empty_store_reads_defaults() {
    let accessor = SettingsAccessor::new(Arc::new(MemoryBlobStore::new()));
    let snap = accessor.read();
    assert_eq!(snap, ConfigurationSnapshot::default());
    assert_eq!(snap.canvas(), Canvas::OUTPUT);

    let public = serde_json::to_value(snap.to_public()).unwrap();
    assert_eq!(
        public,
        serde_json::json!({
            "backgroundUrl": null,
            "overlayUrl": null,
            "userImageArea": { "x": 100, "y": 150, "width": 1000, "height": 1000 },
            "outputWidth": 1200,
            "outputHeight": 1500
        })
    );
}

#[test]
fn unreachable_store_reads_defaults() {
    let accessor = SettingsAccessor::new(Arc::new(UnreachableStore));
    assert_eq!(accessor.read(), ConfigurationSnapshot::default());
    let prepared = accessor.read_prepared();
    assert!(prepared.background.is_none());
    assert_eq!(prepared.user_image_area, LayoutRect::default());
}

#[test]
fn read_assembles_templates_and_layout() {
    let blobs: Arc<MemoryBlobStore> = Arc::new(MemoryBlobStore::new());
    let templates = TemplateAssetStore::new(blobs.clone());
    let layout = LayoutConfigStore::new(blobs.clone());

    let bg_url = templates
        .upload(TemplateRole::Background, &solid_png(3, 3, [1, 2, 3, 255]))
        .unwrap();
    let rect = LayoutRect::new(50, 60, 700, 800).unwrap();
    layout.save(rect).unwrap();

    let accessor = SettingsAccessor::new(blobs.clone());
    let snap = accessor.read();
    assert_eq!(snap.background.as_ref().unwrap().url, bg_url);
    assert!(snap.overlay.is_none());
    assert_eq!(snap.user_image_area, rect);

    let prepared = accessor.prepare(&snap);
    assert_eq!(
        &*prepared.background.unwrap().bytes,
        solid_png(3, 3, [1, 2, 3, 255]).as_slice()
    );
    assert!(prepared.overlay.is_none());
    assert_eq!(prepared.user_image_area, rect);
}

#[test]
fn stale_duplicates_resolve_to_newest_version() {
    let blobs = Arc::new(MemoryBlobStore::new());
    blobs
        .put("settings/overlay_00000000000000000002", b"new", "image/png")
        .unwrap();
    blobs
        .put("settings/overlay_00000000000000000001", b"old", "image/png")
        .unwrap();
    blobs
        .put("settings/overlay-backup.png", b"junk", "image/png")
        .unwrap();

    let snap = SettingsAccessor::new(blobs).read();
    let overlay = snap.overlay.unwrap();
    assert_eq!(overlay.version, 2);
    assert_eq!(overlay.key, "settings/overlay_00000000000000000002");
}

#[test]
fn corrupt_layout_falls_back_but_keeps_templates() {
    let blobs = Arc::new(MemoryBlobStore::new());
    blobs
        .put(
            "settings/config_00000000000000000001.json",
            br#"{"userImageArea":{"x":1,"y":1,"width":0,"height":5}}"#,
            "application/json",
        )
        .unwrap();
    blobs
        .put("settings/background_1", b"bytes", "image/png")
        .unwrap();

    let snap = SettingsAccessor::new(blobs).read();
    assert_eq!(snap.user_image_area, LayoutRect::default());
    assert!(snap.background.is_some());
}

#[test]
fn prepare_drops_templates_that_cannot_be_fetched() {
    let inner = MemoryBlobStore::new();
    inner
        .put("settings/background_1", b"bytes", "image/png")
        .unwrap();
    let accessor = SettingsAccessor::new(Arc::new(ListOnlyStore(inner)));

    let snap = accessor.read();
    assert!(snap.background.is_some());
    let prepared = accessor.prepare(&snap);
    assert!(prepared.background.is_none());
    assert_eq!(prepared.canvas, Canvas::OUTPUT);
}
