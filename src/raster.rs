//! RGBA pixel surfaces.
//!
//! A thin layer over [`image::RgbaImage`] with the handful of operations the
//! converter needs: blank canvases, decoding sheets, cropping, straight-alpha
//! source-over compositing, and PNG persistence.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::error::{AtxError, Result};

/// Failures of in-memory raster operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("crop {w}x{h} at ({x}, {y}) is outside the {width}x{height} source")]
    OutOfBounds {
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        width: u32,
        height: u32,
    },
}

/// An owned RGBA surface with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode an encoded image (PNG, WebP, ...) into a surface.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, RasterError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| RasterError::Decode(e.to_string()))?
            .to_rgba8();
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Get a pixel as RGBA, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Check that a rectangle lies inside the surface and has positive size.
    pub fn contains_rect(&self, x: i64, y: i64, w: i64, h: i64) -> bool {
        x >= 0
            && y >= 0
            && w > 0
            && h > 0
            && x.checked_add(w).is_some_and(|r| r <= self.width() as i64)
            && y.checked_add(h).is_some_and(|b| b <= self.height() as i64)
    }

    /// Copy a rectangle out into a new surface.
    pub fn crop(&self, x: i64, y: i64, w: i64, h: i64) -> std::result::Result<Self, RasterError> {
        if !self.contains_rect(x, y, w, h) {
            return Err(RasterError::OutOfBounds {
                x,
                y,
                w,
                h,
                width: self.width(),
                height: self.height(),
            });
        }

        let piece = image::imageops::crop_imm(&self.image, x as u32, y as u32, w as u32, h as u32)
            .to_image();
        Ok(Self { image: piece })
    }

    /// Draw `src` over this surface with its top-left corner at `(x, y)`.
    ///
    /// The offset may place `src` partly or entirely outside; only the
    /// overlapping region is touched.
    pub fn composite_over(&mut self, src: &Surface, x: i64, y: i64) {
        let (dw, dh) = (self.width() as i64, self.height() as i64);
        let (sw, sh) = (src.width() as i64, src.height() as i64);

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(sw).min(dw);
        let y1 = y.saturating_add(sh).min(dh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for dy in y0..y1 {
            for dx in x0..x1 {
                let s = *src.image.get_pixel((dx - x) as u32, (dy - y) as u32);
                let d = self.image.get_pixel_mut(dx as u32, dy as u32);
                *d = blend_over(s, *d);
            }
        }
    }

    /// Encode the surface as PNG at `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| AtxError::Io {
                path: path.to_path_buf(),
                message: format!("Failed to write PNG: {}", e),
            })
    }

    /// Load a previously saved image from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| AtxError::Io {
                path: path.to_path_buf(),
                message: format!("Failed to load image: {}", e),
            })?
            .to_rgba8();
        Ok(Self { image })
    }
}

/// Straight-alpha source-over: `src` drawn on top of `dst`.
pub fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 || dst[3] == 0 {
        return src;
    }

    let src_a = sa as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let blend = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
