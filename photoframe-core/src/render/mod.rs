/// Source-over compositing of premultiplied surfaces.
pub mod composite;
/// Three-layer output pipeline.
pub mod compositor;
/// Cover-fit geometry and resampling.
pub mod cover;
/// Flattening and JPEG encoding.
pub mod encode;
