//! Types for debayering operations

use crate::isp_pipeline::format::BayerOrder;

/// Unpacked single-channel Bayer samples
#[derive(Debug, Clone)]
pub struct BayerPlane {
    /// Width of the plane in pixels
    pub width: usize,
    /// Height of the plane in pixels
    pub height: usize,
    /// Layout of the top-left 2x2 block
    pub order: BayerOrder,
    /// Significant bits per sample (8, 10 or 16)
    pub bits: u32,
    /// One sample per pixel, row-major
    pub samples: Vec<u16>,
}

/// RGB image data after debayering
#[derive(Debug, Clone)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}
