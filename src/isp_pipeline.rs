//! ISP probe pipeline module
//!
//! Configures a single ISP component for raw Bayer in and RGB out, pushes one
//! synthetic frame through it and saves what comes back as a PPM image.

pub mod common;
pub mod component;
pub mod constants;
pub mod debayer;
pub mod format;
pub mod ppm;
pub mod probe;

pub use common::{
    IspError,
    MmalStatus,
    Result,
};

pub use component::{
    IspBuffer,
    IspComponent,
    Port,
    SoftIsp,
    SoftIspConfig,
    WaitMode,
};

#[cfg(vc_mmal)]
pub use component::MmalIsp;

pub use format::{
    Encoding,
    PortFormat,
};

pub use ppm::{
    ImageWriter,
    PlainPpmWriter,
};

pub use probe::{
    CropBehaviour,
    IspProbe,
    ProbeConfig,
    ProbeConfigBuilder,
    ProbeReport,
};
