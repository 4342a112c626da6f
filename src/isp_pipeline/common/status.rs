use std::fmt;

/// Status codes returned by MMAL calls.
///
/// The software backend reports the same codes so both backends fail the
/// same way from the probe's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmalStatus {
    Success,
    /// Out of memory
    ENoMem,
    /// Out of resources (other than memory)
    ENoSpc,
    /// Argument is invalid
    EInval,
    /// Function not implemented
    ENoSys,
    /// No such file or directory
    ENoEnt,
    /// No such device or address
    ENxio,
    /// I/O error
    EIo,
    /// Illegal seek
    ESpipe,
    /// Data is corrupt
    ECorrupt,
    /// Component is not ready
    ENotReady,
    /// Component is not configured
    EConfig,
    /// Port is already connected
    EIsConn,
    /// Port is disconnected
    ENotConn,
    /// Resource temporarily unavailable, try again later
    EAgain,
    /// Bad address
    EFault,
    Unknown(u32),
}

impl MmalStatus {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::ENoMem,
            2 => Self::ENoSpc,
            3 => Self::EInval,
            4 => Self::ENoSys,
            5 => Self::ENoEnt,
            6 => Self::ENxio,
            7 => Self::EIo,
            8 => Self::ESpipe,
            9 => Self::ECorrupt,
            10 => Self::ENotReady,
            11 => Self::EConfig,
            12 => Self::EIsConn,
            13 => Self::ENotConn,
            14 => Self::EAgain,
            15 => Self::EFault,
            other => Self::Unknown(other),
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            Self::Success => 0,
            Self::ENoMem => 1,
            Self::ENoSpc => 2,
            Self::EInval => 3,
            Self::ENoSys => 4,
            Self::ENoEnt => 5,
            Self::ENxio => 6,
            Self::EIo => 7,
            Self::ESpipe => 8,
            Self::ECorrupt => 9,
            Self::ENotReady => 10,
            Self::EConfig => 11,
            Self::EIsConn => 12,
            Self::ENotConn => 13,
            Self::EAgain => 14,
            Self::EFault => 15,
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "MMAL_SUCCESS",
            Self::ENoMem => "MMAL_ENOMEM",
            Self::ENoSpc => "MMAL_ENOSPC",
            Self::EInval => "MMAL_EINVAL",
            Self::ENoSys => "MMAL_ENOSYS",
            Self::ENoEnt => "MMAL_ENOENT",
            Self::ENxio => "MMAL_ENXIO",
            Self::EIo => "MMAL_EIO",
            Self::ESpipe => "MMAL_ESPIPE",
            Self::ECorrupt => "MMAL_ECORRUPT",
            Self::ENotReady => "MMAL_ENOTREADY",
            Self::EConfig => "MMAL_ECONFIG",
            Self::EIsConn => "MMAL_EISCONN",
            Self::ENotConn => "MMAL_ENOTCONN",
            Self::EAgain => "MMAL_EAGAIN",
            Self::EFault => "MMAL_EFAULT",
            Self::Unknown(_) => "MMAL_UNKNOWN",
        }
    }
}

impl fmt::Display for MmalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x} ({})", self.as_raw(), self.name())
    }
}
