use std::sync::Arc;

use crate::assets::decode::sniff_mime;
use crate::foundation::core::TemplateRole;
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::storage::blob::BlobStore;
use crate::storage::keys::{Slot, SlotIndex, VersionedEntry, next_version, parse_key};

/// The live template for one role.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TemplateAsset {
    /// Role the template plays.
    pub role: TemplateRole,
    /// Store key.
    pub key: String,
    /// Public URL.
    pub url: String,
    /// Slot version; higher is newer.
    pub version: u64,
}

impl TemplateAsset {
    pub(crate) fn from_versioned(role: TemplateRole, v: &VersionedEntry) -> Self {
        Self {
            role,
            key: v.entry.key.clone(),
            url: v.entry.url.clone(),
            version: v.id.version,
        }
    }
}

/// Stores one template image per [`TemplateRole`] with replace-on-upload.
#[derive(Clone)]
pub struct TemplateAssetStore {
    store: Arc<dyn BlobStore>,
}

impl TemplateAssetStore {
    /// Wrap a blob store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Store `bytes` as the template for `role` and return its URL.
    ///
    /// The new blob is written under a fresh version before older blobs of the
    /// role are deleted, so an interrupted upload leaves the old and the new
    /// template side by side and readers pick the new one.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn upload(&self, role: TemplateRole, bytes: &[u8]) -> PhotoframeResult<String> {
        let content_type = sniff_mime(bytes).ok_or_else(|| {
            PhotoframeError::bad_input(format!("{role} template is not a supported image"))
        })?;

        let slot = Slot::Template(role);
        let existing = SlotIndex::from_entries(self.store.list(&slot.prefix())?);
        let floor = existing.get(slot).map(|e| e.id.version);
        let version = next_version(floor);
        let written = self.store.put(&slot.key(version), bytes, content_type)?;

        // The role prefix also matches unparseable leftovers such as `background-old.png`.
        // Versions at or above ours belong to a concurrent upload and stay.
        for old in self.store.list(&slot.prefix()).unwrap_or_default() {
            let newer =
                parse_key(&old.key).is_some_and(|id| id.slot == slot && id.version >= version);
            if old.key == written.key || newer {
                continue;
            }
            if let Err(err) = self.store.delete(&old.url) {
                tracing::warn!(key = %old.key, error = %err, "failed to delete superseded template");
            }
        }

        tracing::info!(%role, key = %written.key, "uploaded template");
        Ok(written.url)
    }

    /// The live template for `role`, or `None` when none is stored or the store is unreachable.
    pub fn current(&self, role: TemplateRole) -> Option<TemplateAsset> {
        let slot = Slot::Template(role);
        let entries = match self.store.list(&slot.prefix()) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%role, error = %err, "template listing failed");
                return None;
            }
        };
        SlotIndex::from_entries(entries)
            .get(slot)
            .map(|v| TemplateAsset::from_versioned(role, v))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/templates.rs"]
mod tests;
