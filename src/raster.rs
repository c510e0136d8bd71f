//! Pixel buffers handed over by the drawing surface.
//!
//! Pixels are RGBA8, row-major, four bytes each; only the alpha byte matters
//! for analysis.

use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{PadError, PadResult};

pub const CHANNELS: usize = 4;
pub const ALPHA_OFFSET: usize = 3;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Axis-aligned box around the covered pixels; `width`/`height` are max - min.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RasterBuffer {
    /// Wraps raw RGBA bytes. The length must be exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> PadResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or_else(|| PadError::invalid(format!("raster {width}x{height} is too large")))?;

        if data.len() != expected {
            return Err(PadError::invalid(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Fully transparent canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Buffer with no pixel data at all.
    pub fn empty() -> Self {
        Self::blank(0, 0)
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn from_png(png_bytes: &[u8]) -> PadResult<Self> {
        let img = image::load_from_memory_with_format(png_bytes, ImageFormat::Png)
            .map_err(|err| PadError::invalid(format!("not a decodable PNG: {err}")))?;
        Ok(Self::from_rgba_image(img.to_rgba8()))
    }

    /// Decodes a `data:image/png;base64,...` URI as produced by [`Self::to_data_uri`].
    pub fn from_data_uri(uri: &str) -> PadResult<Self> {
        let payload = uri
            .strip_prefix(PNG_DATA_URI_PREFIX)
            .ok_or_else(|| PadError::invalid("image data is not a PNG data URI"))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|err| PadError::invalid(format!("malformed base64 payload: {err}")))?;
        Self::from_png(&bytes)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let image = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| anyhow!("raster dimensions do not match its pixel data"))?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .context("failed to encode raster as PNG")?;
        Ok(out.into_inner())
    }

    /// Opaque `imageData` string stored alongside a drawing record.
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(self.to_png()?)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    pub fn has_pixels(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize * self.width as usize + x as usize) * CHANNELS + ALPHA_OFFSET]
    }

    /// True when every channel of every pixel is zero. Stops at the first non-zero byte.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&channel| channel == 0)
    }

    pub fn set_alpha(&mut self, x: u32, y: u32, alpha: u8) {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[idx + ALPHA_OFFSET] = alpha;
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.alpha_at(x, y) == 0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((min_x, min_y, max_x, max_y)) => {
                        (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                    }
                });
            }
        }

        bounds.map(|(min_x, min_y, max_x, max_y)| BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}
