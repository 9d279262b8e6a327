use std::sync::Arc;

use crate::foundation::core::LayoutRect;
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::storage::blob::{BlobEntry, BlobStore};
use crate::storage::keys::{Slot, SlotIndex, next_version};

/// JSON body of a layout record, `{"userImageArea": {...}}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    /// Placement of the user photo.
    pub user_image_area: LayoutRect,
}

/// Stores the admin-chosen [`LayoutRect`] as a versioned record.
#[derive(Clone)]
pub struct LayoutConfigStore {
    store: Arc<dyn BlobStore>,
}

impl LayoutConfigStore {
    /// Wrap a blob store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Replace the layout with `rect` and return the new record's entry.
    ///
    /// The new record is written before older ones are deleted; a failed cleanup
    /// leaves stale records that readers ignore.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, rect: LayoutRect) -> PhotoframeResult<BlobEntry> {
        rect.validate()?;

        let existing = SlotIndex::from_entries(self.store.list(&Slot::Layout.prefix())?);
        let floor = existing.layout.as_ref().map(|e| e.id.version);
        let version = next_version(floor);

        let body = serde_json::to_vec(&LayoutRecord {
            user_image_area: rect,
        })
        .map_err(|e| PhotoframeError::serde(e.to_string()))?;
        let written = self
            .store
            .put(&Slot::Layout.key(version), &body, "application/json")?;

        for old in existing.layout.iter().chain(existing.stale.iter()) {
            if old.entry.key == written.key {
                continue;
            }
            if let Err(err) = self.store.delete(&old.entry.url) {
                tracing::warn!(key = %old.entry.key, error = %err, "failed to delete superseded layout record");
            }
        }

        tracing::info!(key = %written.key, "saved layout");
        Ok(written)
    }

    /// Current layout, or [`LayoutRect::default`] when none is stored, the record is
    /// unreadable, or the store is unreachable.
    pub fn load(&self) -> LayoutRect {
        let entries = match self.store.list(&Slot::Layout.prefix()) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "layout listing failed, using default");
                return LayoutRect::default();
            }
        };
        SlotIndex::from_entries(entries)
            .layout
            .and_then(|latest| read_layout_or_warn(self.store.as_ref(), &latest.entry))
            .unwrap_or_default()
    }
}

/// Fetch and parse a layout record.
pub(crate) fn read_layout(store: &dyn BlobStore, entry: &BlobEntry) -> PhotoframeResult<LayoutRect> {
    let blob = store.fetch(&entry.url)?;
    let record: LayoutRecord = serde_json::from_slice(&blob.bytes)
        .map_err(|e| PhotoframeError::serde(format!("layout record '{}': {e}", entry.key)))?;
    record.user_image_area.validate()?;
    Ok(record.user_image_area)
}

pub(crate) fn read_layout_or_warn(store: &dyn BlobStore, entry: &BlobEntry) -> Option<LayoutRect> {
    match read_layout(store, entry) {
        Ok(rect) => Some(rect),
        Err(err) => {
            tracing::warn!(key = %entry.key, error = %err, "unreadable layout record, using default");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/layout_store.rs"]
mod tests;
