use std::fmt;

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Input,
    Output,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Input => write!(f, "input[0]"),
            Port::Output => write!(f, "output[0]"),
        }
    }
}

/// Whether a buffer request may block until a buffer is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    NoWait,
    Wait,
}

bitflags! {
    /// Buffer header flags, bit-compatible with `MMAL_BUFFER_HEADER_FLAG_*`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferFlags: u32 {
        /// Last buffer of the stream
        const EOS         = 1 << 0;
        const FRAME_START = 1 << 1;
        const FRAME_END   = 1 << 2;
    }
}

/// A payload buffer owned by a component's pool.
pub trait IspBuffer {
    /// Size of the allocation
    fn capacity(&self) -> usize;
    /// Bytes of valid payload
    fn length(&self) -> usize;
    fn set_length(&mut self, length: usize);
    /// The valid payload, `length()` bytes
    fn payload(&self) -> &[u8];
    /// The whole allocation, for filling
    fn data_mut(&mut self) -> &mut [u8];
    fn flags(&self) -> BufferFlags;
    fn set_flags(&mut self, flags: BufferFlags);
}
