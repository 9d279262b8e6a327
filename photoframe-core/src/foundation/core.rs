use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// Width of every generated image, in pixels.
pub const OUTPUT_WIDTH: u32 = 1200;
/// Height of every generated image, in pixels.
pub const OUTPUT_HEIGHT: u32 = 1500;
/// JPEG quality used for generated and converted images.
pub const JPEG_QUALITY: u8 = 90;
/// Upper bound accepted for any [`LayoutRect`] coordinate or extent.
pub const MAX_LAYOUT_EXTENT: u32 = 10_000;

/// Placement of the user photo on the output canvas, in absolute canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LayoutRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width of the photo fragment; must be > 0.
    pub width: u32,
    /// Height of the photo fragment; must be > 0.
    pub height: u32,
}

impl Default for LayoutRect {
    fn default() -> Self {
        Self {
            x: 100,
            y: 150,
            width: 1000,
            height: 1000,
        }
    }
}

impl LayoutRect {
    /// Build a rectangle, rejecting zero or oversized extents.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> PhotoframeResult<Self> {
        let rect = Self {
            x,
            y,
            width,
            height,
        };
        rect.validate()?;
        Ok(rect)
    }

    /// Check the structural invariants: positive extents, every field <= [`MAX_LAYOUT_EXTENT`].
    ///
    /// Rectangles that merely overflow the canvas are valid; the compositor clips them.
    pub fn validate(&self) -> PhotoframeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PhotoframeError::bad_input(
                "userImageArea width/height must be > 0",
            ));
        }
        let max = self.x.max(self.y).max(self.width).max(self.height);
        if max > MAX_LAYOUT_EXTENT {
            return Err(PhotoframeError::bad_input(format!(
                "userImageArea fields must be <= {MAX_LAYOUT_EXTENT}"
            )));
        }
        Ok(())
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Whether the rectangle lies entirely inside `canvas`.
    pub fn fits_within(&self, canvas: Canvas) -> bool {
        self.right() <= u64::from(canvas.width) && self.bottom() <= u64::from(canvas.height)
    }
}

/// Logical role of a template layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateRole {
    /// Bottom layer, cover-fitted to the whole canvas.
    Background,
    /// Top layer, cover-fitted to the whole canvas; usually a frame with a transparent window.
    Overlay,
}

impl TemplateRole {
    /// Both roles in painting order.
    pub const ALL: [Self; 2] = [Self::Background, Self::Overlay];

    /// Wire and key name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Overlay => "overlay",
        }
    }
}

impl std::fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateRole {
    type Err = PhotoframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "background" => Ok(Self::Background),
            "overlay" => Ok(Self::Overlay),
            other => Err(PhotoframeError::bad_input(format!(
                "unknown template type '{other}' (expected background or overlay)"
            ))),
        }
    }
}

/// Output canvas dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The fixed output canvas.
    pub const OUTPUT: Self = Self {
        width: OUTPUT_WIDTH,
        height: OUTPUT_HEIGHT,
    };
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB components.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Dark grey shown wherever no background template covers the canvas.
    pub const BACKDROP: Self = Self::opaque(30, 30, 30);

    /// Premultiplied `[r, g, b, a]` pixel.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            crate::foundation::math::mul_div255_u8(u16::from(c), u16::from(a))
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// Row-major premultiplied RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied bytes.
    pub data: Vec<u8>,
}

impl Surface {
    /// Allocate a surface filled with `fill`.
    pub fn filled(width: u32, height: u32, fill: Rgba8) -> PhotoframeResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| PhotoframeError::composition("surface size overflow"))?;
        let px = fill.to_premul();
        let mut data = vec![0u8; len];
        for chunk in data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap an existing premultiplied buffer, checking its length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> PhotoframeResult<Self> {
        if data.len() as u64 != u64::from(width) * u64::from(height) * 4 {
            return Err(PhotoframeError::composition(format!(
                "surface buffer length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Premultiplied pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
