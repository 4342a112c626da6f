use anyhow::Result;
use tracing::debug;
use std::io::Cursor;
use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use crate::isp_pipeline::debayer::{BayerPlane, RgbImageData};
use crate::isp_pipeline::format::BayerOrder;

pub struct CpuDebayer {
    algorithm: Demosaic,
}

impl CpuDebayer {
    pub fn new() -> Self {
        Self { algorithm: Demosaic::Linear }
    }

    pub fn with_algorithm(algorithm: Demosaic) -> Self {
        Self { algorithm }
    }

    pub fn process(&self, plane: &BayerPlane) -> Result<RgbImageData> {
        let width = plane.width;
        let height = plane.height;
        debug!("Starting CPU debayering for plane {}x{}", width, height);

        if width < 2 || height < 2 {
            anyhow::bail!("Bayer plane {}x{} is too small to demosaic", width, height);
        }
        if plane.samples.len() < width * height {
            anyhow::bail!(
                "Bayer plane holds {} samples, {} needed",
                plane.samples.len(),
                width * height
            );
        }

        // The ISP emits 8-bit RGB, so reduce samples before demosaic
        let shift = plane.bits.saturating_sub(8);
        let bayer_bytes: Vec<u8> = plane.samples[..width * height]
            .iter()
            .map(|&val| (val >> shift).min(u8::MAX as u16) as u8)
            .collect();

        let mut output_buf = vec![0u8; width * height * 3];
        let mut cursor = Cursor::new(&bayer_bytes[..]);
        let cfa = cfa_for(plane.order);

        debug!("Running demosaic with CFA={:?}, algo={:?}", cfa, self.algorithm);

        let mut output_raster = RasterMut::new(
            width,
            height,
            RasterDepth::Depth8,
            &mut output_buf
        );

        bayer::run_demosaic(
            &mut cursor,
            BayerDepth::Depth8,
            cfa,
            self.algorithm,
            &mut output_raster
        ).map_err(|e| anyhow::anyhow!("Demosaic failed: {:?}", e))?;

        Ok(RgbImageData {
            width,
            height,
            data: output_buf,
        })
    }
}

impl Default for CpuDebayer {
    fn default() -> Self {
        Self::new()
    }
}

fn cfa_for(order: BayerOrder) -> CFA {
    match order {
        BayerOrder::Rggb => CFA::RGGB,
        BayerOrder::Bggr => CFA::BGGR,
        BayerOrder::Grbg => CFA::GRBG,
        BayerOrder::Gbrg => CFA::GBRG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_plane(order: BayerOrder, bits: u32, value: u16) -> BayerPlane {
        BayerPlane {
            width: 8,
            height: 6,
            order,
            bits,
            samples: vec![value; 8 * 6],
        }
    }

    #[test]
    fn test_saturated_raw10_is_white() {
        let rgb = CpuDebayer::new()
            .process(&flat_plane(BayerOrder::Bggr, 10, 1023))
            .unwrap();

        assert_eq!((rgb.width, rgb.height), (8, 6));
        assert_eq!(rgb.data.len(), 8 * 6 * 3);
        assert!(rgb.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_depth_reduction() {
        let rgb = CpuDebayer::new()
            .process(&flat_plane(BayerOrder::Rggb, 16, 0x4000))
            .unwrap();
        assert!(rgb.data.iter().all(|&v| v == 0x40));
    }

    #[test]
    fn test_rejects_tiny_plane() {
        let plane = BayerPlane {
            width: 1,
            height: 1,
            order: BayerOrder::Rggb,
            bits: 8,
            samples: vec![0],
        };
        assert!(CpuDebayer::new().process(&plane).is_err());
    }

    #[test]
    fn test_rejects_short_samples() {
        let mut plane = flat_plane(BayerOrder::Grbg, 8, 10);
        plane.samples.truncate(10);
        assert!(CpuDebayer::new().process(&plane).is_err());
    }
}
