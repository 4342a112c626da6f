//! Compile-time defaults for the probe

use crate::isp_pipeline::format::Encoding;

pub const ISP_IN_ENCODING: Encoding = Encoding::BAYER_SBGGR10P;
pub const ISP_OUT_ENCODING: Encoding = Encoding::Rgb24;

pub const ISP_IN_WIDTH: usize = 512 + 64 + 16;
pub const ISP_IN_HEIGHT: usize = 512;
pub const ISP_OUT_WIDTH: usize = ISP_IN_WIDTH;
pub const ISP_OUT_HEIGHT: usize = ISP_IN_HEIGHT;

pub const OUTPUT_FILE: &str = "out.ppm";

/// Every input byte is set to this, saturating all samples.
pub const INPUT_FILL_BYTE: u8 = 0xFF;

/// Save with the 32-aligned width, for firmware that ignores the crop.
pub const ISP_IGNORES_CROPPING: bool = false;
