//! Photoframe composites a visitor's photo into an admin-designed event frame.
//!
//! An administrator uploads two template images (a background and an overlay
//! with a transparent window) and places a rectangle on the fixed
//! `1200 x 1500` canvas. Visitors submit a photo; the engine cover-fits it into
//! that rectangle, sandwiches it between the templates and returns a JPEG.
//!
//! # Pipeline overview
//!
//! 1. **Read**: [`SettingsAccessor`] lists the `settings/` namespace once and
//!    resolves the live background, overlay and layout from versioned keys.
//! 2. **Prepare**: template bytes are fetched up front into a [`PreparedSnapshot`].
//! 3. **Render**: [`Compositor`] decodes and cover-fits the three layers, then
//!    paints backdrop, background, photo and overlay into a premultiplied [`Surface`].
//! 4. **Encode**: the surface is flattened and written as JPEG at quality 90.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Stateless requests**: every request re-reads configuration; user photos are never stored.
//! - **No IO in the compositor**: storage access ends at [`SettingsAccessor::prepare`].
//! - **Write new, then delete old**: replaced records never leave a window with no record.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod foundation;
mod render;
mod service;
mod settings;
mod storage;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use assets::decode::{decode_image, decode_photo, is_heif, sniff_format, sniff_mime};
pub use assets::templates::{TemplateAsset, TemplateAssetStore};
pub use assets::transcode::{CommandTranscoder, Transcoder, convert_to_jpeg};
pub use config::layout_store::{LayoutConfigStore, LayoutRecord};
pub use config::service::{ServiceConfig, TranscoderConfig};
pub use foundation::core::{
    Canvas, JPEG_QUALITY, LayoutRect, MAX_LAYOUT_EXTENT, OUTPUT_HEIGHT, OUTPUT_WIDTH, Rgba8,
    Surface, TemplateRole,
};
pub use foundation::error::{PhotoframeError, PhotoframeResult};
pub use render::composite::{PaintedRegion, PremulRgba8, over, over_at};
pub use render::compositor::{ComposeOpts, Compositor};
pub use render::cover::{CoverPlan, cover_fit, plan_cover};
pub use render::encode::{encode_jpeg, flatten_to_rgb8, to_rgba_image};
pub use service::api::{ApiRequest, ApiResponse, GENERATED_FILE_NAME, PhotoframeApi};
pub use service::auth::{AuthGate, CredentialsGate};
pub use service::data_url::{decode_data_url, encode_data_url};
pub use service::multipart::{FormData, FormPart, boundary_from_content_type};
pub use settings::accessor::{
    ConfigurationSnapshot, PreparedSnapshot, PreparedTemplate, PublicSettings, SettingsAccessor,
};
pub use storage::blob::{Blob, BlobEntry, BlobStore, normalize_key};
pub use storage::fs::FsBlobStore;
pub use storage::keys::{
    SETTINGS_PREFIX, Slot, SlotIndex, SlotKey, VersionedEntry, next_version, parse_key,
};
pub use storage::memory::{MEMORY_BASE_URL, MemoryBlobStore};
