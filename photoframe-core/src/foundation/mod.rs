/// Canvas, layout and pixel primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Fixed-point helpers for premultiplied pixels.
pub mod math;
