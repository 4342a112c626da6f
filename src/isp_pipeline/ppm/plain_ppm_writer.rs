use std::io::{BufWriter, Write};
use tracing::debug;
use crate::isp_pipeline::common::error::{IspError, Result};
use crate::isp_pipeline::ppm::writer::ImageWriter;

/// Plain (ASCII, `P3`) PPM with one `R G B` line per pixel.
pub struct PlainPpmWriter;

impl ImageWriter for PlainPpmWriter {
    fn write_rgb(&self, data: &[u8], width: usize, height: usize, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding PPM image: {}x{}", width, height);

        if width == 0 || height == 0 {
            return Err(IspError::InvalidDimensions(width, height));
        }
        let needed = width * height * 3;
        if data.len() < needed {
            return Err(IspError::BufferTooSmall { needed, available: data.len() });
        }

        let mut out = BufWriter::new(output);
        write!(out, "P3\n{} {}\n255\n", width, height)?;
        for pixel in data[..needed].chunks_exact(3) {
            writeln!(out, "{} {} {}", pixel[0], pixel[1], pixel[2])?;
        }
        out.flush()?;

        debug!("PPM encoding complete");
        Ok(())
    }
}
