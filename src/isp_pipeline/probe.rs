//! ISP probe: one synthetic frame through the component, out to a PPM file

mod pipeline;
mod timing;
mod types;

#[cfg(test)]
mod tests;

pub use pipeline::IspProbe;
pub use timing::StepTimings;
pub use types::{CropBehaviour, ProbeConfig, ProbeConfigBuilder, ProbeReport};
