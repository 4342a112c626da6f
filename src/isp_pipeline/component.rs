//! ISP component backends
//!
//! `MmalIsp` drives the VideoCore firmware through the MMAL component
//! wrapper and only exists when `build.rs` found the userland SDK.
//! `SoftIsp` emulates the same buffer exchange on the CPU.

mod isp_component;
#[cfg(vc_mmal)]
pub mod mmal_isp;
pub mod soft_isp;
pub mod types;

pub use isp_component::IspComponent;
#[cfg(vc_mmal)]
pub use mmal_isp::{MmalBuffer, MmalIsp};
pub use soft_isp::{SoftBuffer, SoftIsp, SoftIspConfig};
pub use types::{BufferFlags, IspBuffer, Port, WaitMode};

/// Name of the VideoCore ISP component.
pub const ISP_COMPONENT_NAME: &str = "vc.ril.isp";
