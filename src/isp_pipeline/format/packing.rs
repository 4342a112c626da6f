//! Alignment and raw Bayer unpacking

use crate::isp_pipeline::common::error::{IspError, Result};

/// Rounds `value` up to a multiple of `align`, which must be a power of two.
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Row stride of a CSI-2 10-bit packed line: 5 bytes per 4 pixels, padded to 32 bytes.
pub const fn raw_stride(width: usize) -> usize {
    align_up((width * 5 + 3) >> 2, 32)
}

fn check_len(data: &[u8], stride: usize, row_bytes: usize, height: usize) -> Result<()> {
    if height == 0 {
        return Ok(());
    }
    if stride < row_bytes {
        return Err(IspError::BufferTooSmall { needed: row_bytes, available: stride });
    }
    let needed = stride * (height - 1) + row_bytes;
    if data.len() < needed {
        return Err(IspError::BufferTooSmall { needed, available: data.len() });
    }
    Ok(())
}

/// Unpacks CSI-2 10-bit packed rows into one sample per pixel.
///
/// Each group of 5 bytes carries 4 pixels:
/// ```text
/// [A9:A2][B9:B2][C9:C2][D9:D2][D1:D0,C1:C0,B1:B0,A1:A0]
/// ```
pub fn unpack_raw10(data: &[u8], stride: usize, width: usize, height: usize) -> Result<Vec<u16>> {
    let row_bytes = (width * 5).div_ceil(4);
    check_len(data, stride, row_bytes, height)?;

    let mut output = Vec::with_capacity(width * height);
    for row in 0..height {
        let start = row * stride;
        let line = &data[start..(start + stride).min(data.len())];
        for x in 0..width {
            let group = (x / 4) * 5;
            let lane = x % 4;
            let high = line[group + lane] as u16;
            // A partial trailing group still carries its low bits in the fifth byte
            let low = line.get(group + 4).map_or(0, |&b| ((b >> (2 * lane)) & 0x03) as u16);
            output.push((high << 2) | low);
        }
    }
    Ok(output)
}

pub fn unpack_raw8(data: &[u8], stride: usize, width: usize, height: usize) -> Result<Vec<u16>> {
    check_len(data, stride, width, height)?;

    let mut output = Vec::with_capacity(width * height);
    for row in 0..height {
        let line = &data[row * stride..row * stride + width];
        output.extend(line.iter().map(|&v| v as u16));
    }
    Ok(output)
}

/// Little-endian 16-bit samples.
pub fn unpack_raw16(data: &[u8], stride: usize, width: usize, height: usize) -> Result<Vec<u16>> {
    check_len(data, stride, width * 2, height)?;

    let mut output = Vec::with_capacity(width * height);
    for row in 0..height {
        let line = &data[row * stride..row * stride + width * 2];
        output.extend(line.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]])));
    }
    Ok(output)
}
