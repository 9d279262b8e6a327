use std::sync::Arc;

use crate::assets::templates::TemplateAsset;
use crate::config::layout_store::read_layout_or_warn;
use crate::foundation::core::{Canvas, LayoutRect, OUTPUT_HEIGHT, OUTPUT_WIDTH, TemplateRole};
use crate::storage::blob::BlobStore;
use crate::storage::keys::{SETTINGS_PREFIX, SlotIndex};

/// Fully resolved configuration for one request. Derived on every read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    /// Live background template, if any.
    pub background: Option<TemplateAsset>,
    /// Live overlay template, if any.
    pub overlay: Option<TemplateAsset>,
    /// Where the user photo goes.
    pub user_image_area: LayoutRect,
    /// Output width in pixels.
    pub output_width: u32,
    /// Output height in pixels.
    pub output_height: u32,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        Self {
            background: None,
            overlay: None,
            user_image_area: LayoutRect::default(),
            output_width: OUTPUT_WIDTH,
            output_height: OUTPUT_HEIGHT,
        }
    }
}

impl ConfigurationSnapshot {
    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.output_width,
            height: self.output_height,
        }
    }

    /// Template for `role`.
    pub fn template(&self, role: TemplateRole) -> Option<&TemplateAsset> {
        match role {
            TemplateRole::Background => self.background.as_ref(),
            TemplateRole::Overlay => self.overlay.as_ref(),
        }
    }

    /// Body of `GET /api/settings`.
    pub fn to_public(&self) -> PublicSettings {
        PublicSettings {
            background_url: self.background.as_ref().map(|t| t.url.clone()),
            overlay_url: self.overlay.as_ref().map(|t| t.url.clone()),
            user_image_area: self.user_image_area,
            output_width: self.output_width,
            output_height: self.output_height,
        }
    }
}

/// Wire form of a [`ConfigurationSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    /// URL of the background template.
    pub background_url: Option<String>,
    /// URL of the overlay template.
    pub overlay_url: Option<String>,
    /// Where the user photo goes.
    pub user_image_area: LayoutRect,
    /// Output width in pixels.
    pub output_width: u32,
    /// Output height in pixels.
    pub output_height: u32,
}

/// Template bytes fetched for composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedTemplate {
    /// Store key the bytes came from.
    pub key: String,
    /// Encoded image bytes.
    pub bytes: Arc<[u8]>,
}

/// Snapshot with template bytes front-loaded so composition does no IO.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSnapshot {
    /// Background template bytes.
    pub background: Option<PreparedTemplate>,
    /// Overlay template bytes.
    pub overlay: Option<PreparedTemplate>,
    /// Where the user photo goes.
    pub user_image_area: LayoutRect,
    /// Output canvas.
    pub canvas: Canvas,
}

impl PreparedSnapshot {
    /// Snapshot with no templates on the standard canvas.
    pub fn bare(user_image_area: LayoutRect) -> Self {
        Self {
            background: None,
            overlay: None,
            user_image_area,
            canvas: Canvas::OUTPUT,
        }
    }

    /// Set the template for `role` from raw bytes.
    pub fn with_template(
        mut self,
        role: TemplateRole,
        key: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let t = Some(PreparedTemplate {
            key: key.into(),
            bytes: bytes.into(),
        });
        match role {
            TemplateRole::Background => self.background = t,
            TemplateRole::Overlay => self.overlay = t,
        }
        self
    }
}

/// Read path over the settings namespace. Never fails: missing or unreachable
/// configuration degrades to defaults.
#[derive(Clone)]
pub struct SettingsAccessor {
    store: Arc<dyn BlobStore>,
}

impl SettingsAccessor {
    /// Wrap a blob store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Assemble the current snapshot from one listing of the settings namespace.
    #[tracing::instrument(skip(self))]
    pub fn read(&self) -> ConfigurationSnapshot {
        let entries = match self.store.list(SETTINGS_PREFIX) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "settings listing failed, serving defaults");
                return ConfigurationSnapshot::default();
            }
        };

        let index = SlotIndex::from_entries(entries);
        if !index.stale.is_empty() {
            tracing::debug!(count = index.stale.len(), "ignoring superseded settings records");
        }

        let user_image_area = index
            .layout
            .as_ref()
            .and_then(|v| read_layout_or_warn(self.store.as_ref(), &v.entry))
            .unwrap_or_default();

        ConfigurationSnapshot {
            background: index
                .background
                .as_ref()
                .map(|v| TemplateAsset::from_versioned(TemplateRole::Background, v)),
            overlay: index
                .overlay
                .as_ref()
                .map(|v| TemplateAsset::from_versioned(TemplateRole::Overlay, v)),
            user_image_area,
            ..ConfigurationSnapshot::default()
        }
    }

    /// Fetch the template bytes `snapshot` refers to. A template that cannot be
    /// fetched is dropped from the result.
    pub fn prepare(&self, snapshot: &ConfigurationSnapshot) -> PreparedSnapshot {
        let fetch = |role: TemplateRole| {
            let asset = snapshot.template(role)?;
            match self.store.fetch(&asset.url) {
                Ok(blob) => Some(PreparedTemplate {
                    key: asset.key.clone(),
                    bytes: blob.bytes.into(),
                }),
                Err(err) => {
                    tracing::warn!(
                        %role,
                        key = %asset.key,
                        error = %err,
                        "template fetch failed, skipping layer"
                    );
                    None
                }
            }
        };

        PreparedSnapshot {
            background: fetch(TemplateRole::Background),
            overlay: fetch(TemplateRole::Overlay),
            user_image_area: snapshot.user_image_area,
            canvas: snapshot.canvas(),
        }
    }

    /// [`read`](Self::read) followed by [`prepare`](Self::prepare).
    pub fn read_prepared(&self) -> PreparedSnapshot {
        self.prepare(&self.read())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/accessor.rs"]
mod tests;
