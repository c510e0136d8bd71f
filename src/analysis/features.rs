use serde::{Deserialize, Serialize};

use crate::raster::{RasterBuffer, ALPHA_OFFSET, CHANNELS};

/// Alpha difference to a 4-connected neighbour above which a pixel is an edge.
pub const EDGE_ALPHA_THRESHOLD: u8 = 50;

/// Edge pixels per estimated stroke.
const EDGES_PER_STROKE: f64 = 50.0;

/// Raster statistics consumed by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    /// Percentage of pixels with alpha > 0.
    pub coverage: u32,
    /// Percentage of covered pixels sitting on a sharp alpha transition.
    pub complexity: u32,
    #[serde(default)]
    pub pixel_count: u64,
    #[serde(default)]
    pub edge_count: u64,
    pub stroke_count: u64,
}

/// Single pass over the alpha channel. A buffer with no pixel data yields the
/// zeroed feature set (including `stroke_count == 0`).
pub fn extract_features(buffer: &RasterBuffer) -> FeatureSet {
    if !buffer.has_pixels() {
        return FeatureSet::default();
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let data = buffer.data();
    let alpha = |pixel: usize| data[pixel * CHANNELS + ALPHA_OFFSET];

    let mut pixel_count: u64 = 0;
    let mut edge_count: u64 = 0;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let a = alpha(idx);
            if a == 0 {
                continue;
            }
            pixel_count += 1;

            let interior = x > 0 && y > 0 && x + 1 < width && y + 1 < height;
            if !interior {
                continue;
            }

            let neighbours = [alpha(idx - 1), alpha(idx + 1), alpha(idx - width), alpha(idx + width)];
            if neighbours
                .iter()
                .any(|&n| n.abs_diff(a) > EDGE_ALPHA_THRESHOLD)
            {
                edge_count += 1;
            }
        }
    }

    let total_pixels = (width * height) as f64;
    let coverage = (100.0 * pixel_count as f64 / total_pixels).round() as u32;
    let complexity = (100.0 * edge_count as f64 / pixel_count.max(1) as f64).round() as u32;

    FeatureSet {
        coverage,
        complexity,
        pixel_count,
        edge_count,
        stroke_count: ((edge_count as f64 / EDGES_PER_STROKE).round() as u64).max(1),
    }
}
