use std::sync::Arc;

use image::imageops::FilterType;

use crate::assets::decode::{decode_image, decode_photo};
use crate::assets::transcode::Transcoder;
use crate::foundation::core::{Canvas, JPEG_QUALITY, Rgba8, Surface, TemplateRole};
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::render::composite::over_at;
use crate::render::cover::cover_fit;
use crate::render::encode::encode_jpeg;
use crate::settings::accessor::{PreparedSnapshot, PreparedTemplate};

/// Tunables for [`Compositor`].
#[derive(Clone, Copy, Debug)]
pub struct ComposeOpts {
    /// Resampling filter used for every cover fit.
    pub filter: FilterType,
    /// Opaque color under all layers.
    pub backdrop: Rgba8,
    /// JPEG quality of the encoded output.
    pub jpeg_quality: u8,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            backdrop: Rgba8::BACKDROP,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

/// Composites a user photo between the background and overlay templates.
///
/// Pure: no IO, no retained state. Painting order is backdrop, background,
/// photo, overlay.
#[derive(Clone, Default)]
pub struct Compositor {
    opts: ComposeOpts,
    transcoder: Option<Arc<dyn Transcoder>>,
}

impl Compositor {
    /// Build a compositor.
    pub fn new(opts: ComposeOpts) -> Self {
        Self {
            opts,
            transcoder: None,
        }
    }

    /// Route legacy photo formats through `transcoder` before decoding.
    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// Options in use.
    pub fn opts(&self) -> ComposeOpts {
        self.opts
    }

    /// Composite `user_photo` onto the templates and return the flattened canvas.
    #[tracing::instrument(skip_all, fields(photo_len = user_photo.len()))]
    pub fn render(
        &self,
        user_photo: &[u8],
        snapshot: &PreparedSnapshot,
    ) -> PhotoframeResult<Surface> {
        let area = snapshot.user_image_area;
        area.validate().map_err(|e| {
            PhotoframeError::composition(format!("invalid user image area: {e}"))
        })?;
        let canvas = snapshot.canvas;

        let layer = |role: TemplateRole| {
            let template = match role {
                TemplateRole::Background => snapshot.background.as_ref(),
                TemplateRole::Overlay => snapshot.overlay.as_ref(),
            };
            self.template_layer(role, template, canvas)
        };
        let (photo, (background, overlay)) = rayon::join(
            || self.photo_layer(user_photo, area.width, area.height),
            || {
                rayon::join(
                    || layer(TemplateRole::Background),
                    || layer(TemplateRole::Overlay),
                )
            },
        );
        let photo = photo?;
        let background = background?;
        let overlay = overlay?;

        let mut out = Surface::filled(canvas.width, canvas.height, self.opts.backdrop)?;
        if let Some(bg) = &background {
            over_at(&mut out, bg, 0, 0);
        }

        let painted = over_at(&mut out, &photo, i64::from(area.x), i64::from(area.y));
        let fully_painted =
            painted.is_some_and(|r| r.x1 - r.x0 == photo.width && r.y1 - r.y0 == photo.height);
        if !fully_painted {
            tracing::debug!(?area, ?painted, "user photo clipped to canvas");
        }

        if let Some(ov) = &overlay {
            over_at(&mut out, ov, 0, 0);
        }
        Ok(out)
    }

    /// Composite and encode as JPEG.
    pub fn compose(
        &self,
        user_photo: &[u8],
        snapshot: &PreparedSnapshot,
    ) -> PhotoframeResult<Vec<u8>> {
        let canvas = self.render(user_photo, snapshot)?;
        encode_jpeg(&canvas, self.opts.backdrop, self.opts.jpeg_quality)
    }

    fn photo_layer(&self, bytes: &[u8], width: u32, height: u32) -> PhotoframeResult<Surface> {
        let decoded = decode_photo(bytes, self.transcoder.as_deref())?;
        cover_fit(&decoded, width, height, self.opts.filter)
    }

    fn template_layer(
        &self,
        role: TemplateRole,
        template: Option<&PreparedTemplate>,
        canvas: Canvas,
    ) -> PhotoframeResult<Option<Surface>> {
        let Some(template) = template else {
            return Ok(None);
        };
        let decoded = decode_image(&template.bytes).map_err(|e| match e {
            PhotoframeError::Decode(msg) => {
                PhotoframeError::decode(format!("{role} template '{}': {msg}", template.key))
            }
            other => other,
        })?;
        cover_fit(&decoded, canvas.width, canvas.height, self.opts.filter).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
