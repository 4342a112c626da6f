//! Port format negotiation: aligned frame plus crop rectangle

use crate::isp_pipeline::common::error::{IspError, Result};
use crate::isp_pipeline::format::encoding::Encoding;
use crate::isp_pipeline::format::packing::align_up;

/// Frame width alignment required by the VideoCore ISP.
pub const FRAME_WIDTH_ALIGN: usize = 32;
/// Frame height alignment required by the VideoCore ISP.
pub const FRAME_HEIGHT_ALIGN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Video format committed to one port of the ISP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortFormat {
    pub encoding: Encoding,
    /// Frame width, aligned
    pub width: usize,
    /// Frame height, aligned
    pub height: usize,
    /// Region of the frame holding real pixels
    pub crop: Rect,
}

impl PortFormat {
    /// Format for a `width` x `height` picture: the frame is rounded up to
    /// the ISP's alignment and the crop carries the real size.
    pub fn for_frame(encoding: Encoding, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(IspError::InvalidDimensions(width, height));
        }
        let encoding = encoding.validate()?;

        Ok(Self {
            encoding,
            width: align_up(width, FRAME_WIDTH_ALIGN),
            height: align_up(height, FRAME_HEIGHT_ALIGN),
            crop: Rect { x: 0, y: 0, width, height },
        })
    }

    /// Bytes per row of the full frame.
    pub fn stride(&self) -> usize {
        self.encoding.bytes_per_line(self.width)
    }

    /// Size of a buffer holding one full aligned frame.
    pub fn buffer_size(&self) -> usize {
        self.stride() * self.height
    }

    /// Checks the crop rectangle lies inside the frame.
    pub fn validate(&self) -> Result<()> {
        let crop = self.crop;
        if crop.width == 0
            || crop.height == 0
            || crop.x + crop.width > self.width
            || crop.y + crop.height > self.height
        {
            return Err(IspError::InvalidDimensions(crop.width, crop.height));
        }
        Ok(())
    }
}

/// Output lengths for an RGB24 frame of `width` x `height`: `(cropped, uncropped)`.
///
/// Firmware that honours the crop returns tightly packed rows; firmware that
/// ignores it returns rows of the 32-aligned frame width.
pub fn expected_output_lengths(width: usize, height: usize) -> (usize, usize) {
    (width * height * 3, align_up(width, FRAME_WIDTH_ALIGN) * height * 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_frame_aligns_and_crops() {
        let format = PortFormat::for_frame(Encoding::BAYER_SBGGR10P, 592, 512).unwrap();

        assert_eq!(format.width, 608);
        assert_eq!(format.height, 512);
        assert_eq!(format.crop, Rect { x: 0, y: 0, width: 592, height: 512 });
        assert_eq!(format.stride(), 768);
        assert_eq!(format.buffer_size(), 768 * 512);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_for_frame_aligns_height() {
        let format = PortFormat::for_frame(Encoding::Rgb24, 100, 50).unwrap();
        assert_eq!((format.width, format.height), (128, 64));
        assert_eq!(format.buffer_size(), 128 * 3 * 64);
    }

    #[test]
    fn test_for_frame_rejects_zero() {
        assert!(matches!(
            PortFormat::for_frame(Encoding::Rgb24, 0, 16),
            Err(IspError::InvalidDimensions(0, 16))
        ));
    }

    #[test]
    fn test_validate_rejects_crop_outside_frame() {
        let mut format = PortFormat::for_frame(Encoding::Rgb24, 64, 64).unwrap();
        format.crop.x = 8;
        assert!(format.validate().is_err());
    }

    #[test]
    fn test_expected_output_lengths() {
        assert_eq!(expected_output_lengths(592, 512), (909_312, 933_888));
        assert_eq!(expected_output_lengths(64, 2), (384, 384));
    }
}
