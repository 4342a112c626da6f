use std::panic::Location;

use thiserror::Error;

use crate::isp_pipeline::common::status::MmalStatus;

#[derive(Error, Debug)]
pub enum IspError {
    #[error("{location}:{function}: {call}: {status}")]
    Mmal {
        /// Function that made the call
        function: &'static str,
        call: &'static str,
        status: MmalStatus,
        location: &'static Location<'static>,
    },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Buffer too small: needed {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Debayer failed: {0}")]
    Debayer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IspError {
    /// Failure of `call` made from `function`, tagged with the caller's location.
    #[track_caller]
    pub fn mmal(function: &'static str, call: &'static str, status: MmalStatus) -> Self {
        IspError::Mmal {
            function,
            call,
            status,
            location: Location::caller(),
        }
    }

    /// Status code carried by a vendor call failure, if this is one.
    pub fn status(&self) -> Option<MmalStatus> {
        match self {
            IspError::Mmal { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IspError>;

/// Maps a raw MMAL status to `Ok(())` or an `IspError::Mmal` tagged with the caller's location.
#[track_caller]
pub fn check_status(raw: u32, function: &'static str, call: &'static str) -> Result<()> {
    let status = MmalStatus::from_raw(raw);
    if status.is_success() {
        Ok(())
    } else {
        Err(IspError::mmal(function, call, status))
    }
}

/// Strips the module path and closure frames from a `type_name` of a nested fn item.
pub fn short_function_name(full: &'static str) -> &'static str {
    let mut name = full.strip_suffix("::here").unwrap_or(full);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Bare name of the enclosing function.
macro_rules! function_name {
    () => {{
        fn here() {}
        $crate::isp_pipeline::common::error::short_function_name(::std::any::type_name_of_val(&here))
    }};
}
pub(crate) use function_name;

/// `IspError::Mmal` for `call` failing with `status` in the enclosing function.
macro_rules! mmal_error {
    ($call:expr, $status:expr) => {
        $crate::isp_pipeline::common::IspError::mmal(
            $crate::isp_pipeline::common::function_name!(),
            $call,
            $status,
        )
    };
}
pub(crate) use mmal_error;
