//! Common utilities module
//!
//! Error types and MMAL status codes shared by every backend.

pub mod error;
pub mod status;

pub use error::{check_status, IspError, Result};
pub(crate) use error::{function_name, mmal_error};
pub use status::MmalStatus;
