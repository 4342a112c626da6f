//! MMAL fourcc encodings understood by the probe

use std::fmt;

use crate::isp_pipeline::common::error::{IspError, Result};
use crate::isp_pipeline::format::packing::{align_up, raw_stride};

/// Builds a little-endian fourcc the way `MMAL_FOURCC` does.
pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

/// Renders a fourcc as its four ASCII characters, `?` for anything unprintable.
pub fn fourcc_to_string(code: u32) -> String {
    code.to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
        .collect()
}

/// Colour filter array layout, named by the top-left 2x2 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerOrder {
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl BayerOrder {
    /// Layout seen by a window whose origin is moved by (`dx`, `dy`) pixels.
    pub fn shifted(self, dx: usize, dy: usize) -> Self {
        let mut order = self;
        if dx % 2 == 1 {
            order = match order {
                Self::Rggb => Self::Grbg,
                Self::Grbg => Self::Rggb,
                Self::Bggr => Self::Gbrg,
                Self::Gbrg => Self::Bggr,
            };
        }
        if dy % 2 == 1 {
            order = match order {
                Self::Rggb => Self::Gbrg,
                Self::Gbrg => Self::Rggb,
                Self::Bggr => Self::Grbg,
                Self::Grbg => Self::Bggr,
            };
        }
        order
    }
}

/// Port encodings. Bayer variants carry sample depth and whether rows are CSI-2 packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Bayer {
        order: BayerOrder,
        bits: u32,
        packed: bool,
    },
    Rgb24,
    Bgr24,
}

impl Encoding {
    pub const BAYER_SBGGR10P: Encoding = Encoding::Bayer { order: BayerOrder::Bggr, bits: 10, packed: true };
    pub const BAYER_SGBRG10P: Encoding = Encoding::Bayer { order: BayerOrder::Gbrg, bits: 10, packed: true };
    pub const BAYER_SGRBG10P: Encoding = Encoding::Bayer { order: BayerOrder::Grbg, bits: 10, packed: true };
    pub const BAYER_SRGGB10P: Encoding = Encoding::Bayer { order: BayerOrder::Rggb, bits: 10, packed: true };
    pub const BAYER_SBGGR8: Encoding = Encoding::Bayer { order: BayerOrder::Bggr, bits: 8, packed: false };
    pub const BAYER_SGBRG8: Encoding = Encoding::Bayer { order: BayerOrder::Gbrg, bits: 8, packed: false };
    pub const BAYER_SGRBG8: Encoding = Encoding::Bayer { order: BayerOrder::Grbg, bits: 8, packed: false };
    pub const BAYER_SRGGB8: Encoding = Encoding::Bayer { order: BayerOrder::Rggb, bits: 8, packed: false };
    pub const BAYER_SBGGR16: Encoding = Encoding::Bayer { order: BayerOrder::Bggr, bits: 16, packed: false };
    pub const BAYER_SGBRG16: Encoding = Encoding::Bayer { order: BayerOrder::Gbrg, bits: 16, packed: false };
    pub const BAYER_SGRBG16: Encoding = Encoding::Bayer { order: BayerOrder::Grbg, bits: 16, packed: false };
    pub const BAYER_SRGGB16: Encoding = Encoding::Bayer { order: BayerOrder::Rggb, bits: 16, packed: false };

    const FOURCC_TABLE: [(u32, Encoding); 14] = [
        (fourcc(b'p', b'B', b'A', b'A'), Encoding::BAYER_SBGGR10P),
        (fourcc(b'p', b'G', b'A', b'A'), Encoding::BAYER_SGBRG10P),
        (fourcc(b'p', b'g', b'A', b'A'), Encoding::BAYER_SGRBG10P),
        (fourcc(b'p', b'R', b'A', b'A'), Encoding::BAYER_SRGGB10P),
        (fourcc(b'B', b'A', b'8', b'1'), Encoding::BAYER_SBGGR8),
        (fourcc(b'G', b'B', b'R', b'G'), Encoding::BAYER_SGBRG8),
        (fourcc(b'G', b'R', b'B', b'G'), Encoding::BAYER_SGRBG8),
        (fourcc(b'R', b'G', b'G', b'B'), Encoding::BAYER_SRGGB8),
        (fourcc(b'B', b'G', b'1', b'6'), Encoding::BAYER_SBGGR16),
        (fourcc(b'G', b'B', b'1', b'6'), Encoding::BAYER_SGBRG16),
        (fourcc(b'B', b'A', b'1', b'6'), Encoding::BAYER_SGRBG16),
        (fourcc(b'R', b'G', b'1', b'6'), Encoding::BAYER_SRGGB16),
        (fourcc(b'R', b'G', b'B', b'3'), Encoding::Rgb24),
        (fourcc(b'B', b'G', b'R', b'3'), Encoding::Bgr24),
    ];

    pub fn to_fourcc(self) -> u32 {
        Self::FOURCC_TABLE
            .iter()
            .find(|(_, encoding)| *encoding == self)
            .map(|(code, _)| *code)
            // Unlisted Bayer depths have no fourcc
            .unwrap_or(0)
    }

    pub fn from_fourcc(code: u32) -> Result<Self> {
        Self::FOURCC_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, encoding)| *encoding)
            .ok_or_else(|| IspError::UnsupportedEncoding(fourcc_to_string(code)))
    }

    /// Checks that a hand-built `Bayer` value is one the table knows about.
    pub fn validate(self) -> Result<Self> {
        match self {
            Encoding::Bayer { bits, packed, .. } => match (bits, packed) {
                (10, true) | (8, false) | (16, false) => Ok(self),
                _ => Err(IspError::UnsupportedEncoding(format!(
                    "{}-bit {} Bayer",
                    bits,
                    if packed { "packed" } else { "unpacked" }
                ))),
            },
            Encoding::Rgb24 | Encoding::Bgr24 => Ok(self),
        }
    }

    pub fn is_bayer(self) -> bool {
        matches!(self, Encoding::Bayer { .. })
    }

    /// Bytes occupied by one row of `width` pixels, including any alignment the encoding requires.
    pub fn bytes_per_line(self, width: usize) -> usize {
        match self {
            Encoding::Bayer { bits: 10, packed: true, .. } => raw_stride(width),
            Encoding::Bayer { bits, .. } => align_up(width * (bits as usize).div_ceil(8), 32),
            Encoding::Rgb24 | Encoding::Bgr24 => width * 3,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", fourcc_to_string(self.to_fourcc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_matches_mmal_layout() {
        assert_eq!(fourcc(b'R', b'G', b'B', b'3'), 0x3342_4752);
        assert_eq!(Encoding::BAYER_SBGGR10P.to_string(), "pBAA");
        assert_eq!(Encoding::Rgb24.to_string(), "RGB3");
    }

    #[test]
    fn test_fourcc_lookup() {
        let code = Encoding::BAYER_SRGGB10P.to_fourcc();
        assert_eq!(Encoding::from_fourcc(code).unwrap(), Encoding::BAYER_SRGGB10P);

        let err = Encoding::from_fourcc(fourcc(b'N', b'V', b'1', b'2')).unwrap_err();
        assert!(matches!(err, IspError::UnsupportedEncoding(ref s) if s == "NV12"));
    }

    #[test]
    fn test_validate_rejects_unknown_bayer_depth() {
        let odd = Encoding::Bayer { order: BayerOrder::Rggb, bits: 12, packed: true };
        assert!(odd.validate().is_err());
        assert!(Encoding::BAYER_SBGGR10P.validate().is_ok());
    }

    #[test]
    fn test_bytes_per_line() {
        assert_eq!(Encoding::BAYER_SBGGR10P.bytes_per_line(592), 768);
        assert_eq!(Encoding::BAYER_SBGGR8.bytes_per_line(40), 64);
        assert_eq!(Encoding::BAYER_SBGGR16.bytes_per_line(40), 96);
        assert_eq!(Encoding::Rgb24.bytes_per_line(608), 1824);
    }

    #[test]
    fn test_bayer_order_shift() {
        assert_eq!(BayerOrder::Bggr.shifted(0, 0), BayerOrder::Bggr);
        assert_eq!(BayerOrder::Bggr.shifted(1, 0), BayerOrder::Gbrg);
        assert_eq!(BayerOrder::Bggr.shifted(0, 1), BayerOrder::Grbg);
        assert_eq!(BayerOrder::Bggr.shifted(1, 1), BayerOrder::Rggb);
        assert_eq!(BayerOrder::Rggb.shifted(2, 4), BayerOrder::Rggb);
    }
}
