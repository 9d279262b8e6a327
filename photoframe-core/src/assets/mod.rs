/// Raster decoding into premultiplied surfaces.
pub mod decode;
/// Template images stored per role.
pub mod templates;
/// Legacy-format transcoding.
pub mod transcode;
