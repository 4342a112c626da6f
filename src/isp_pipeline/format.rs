//! Pixel encodings, port formats and raw packing helpers

pub mod encoding;
pub mod packing;
pub mod port_format;

pub use encoding::{fourcc, fourcc_to_string, BayerOrder, Encoding};
pub use packing::{align_up, raw_stride, unpack_raw10, unpack_raw16, unpack_raw8};
pub use port_format::{expected_output_lengths, PortFormat, Rect};
