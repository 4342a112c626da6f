//! PPM writing module

mod plain_ppm_writer;
mod writer;

pub use plain_ppm_writer::PlainPpmWriter;
pub use writer::ImageWriter;
