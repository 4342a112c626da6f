use std::io::Write;
use crate::isp_pipeline::common::error::Result;

pub trait ImageWriter {
    /// Writes `width` x `height` interleaved RGB pixels read from `data` with a row stride of `width * 3`.
    fn write_rgb(&self, data: &[u8], width: usize, height: usize, output: &mut dyn Write) -> Result<()>;
}
