use crate::isp_pipeline::common::error::Result;
use crate::isp_pipeline::component::types::{IspBuffer, Port, WaitMode};
use crate::isp_pipeline::format::PortFormat;

/// The synchronous wrapper surface of a single-input, single-output ISP.
///
/// `buffer_get_empty` and `buffer_get_full` return `Ok(None)` when nothing is
/// available and the caller did not ask to wait.
pub trait IspComponent {
    type Buffer: IspBuffer;

    fn name(&self) -> &str;
    fn commit_format(&mut self, port: Port, format: &PortFormat) -> Result<()>;
    fn port_format(&self, port: Port) -> Option<PortFormat>;
    /// Enables the port with component-allocated payloads.
    fn enable_port(&mut self, port: Port) -> Result<()>;
    fn buffer_get_empty(&mut self, port: Port, wait: WaitMode) -> Result<Option<Self::Buffer>>;
    /// Hands a buffer to the port; ownership passes to the component.
    fn send_buffer(&mut self, port: Port, buffer: Self::Buffer) -> Result<()>;
    fn buffer_get_full(&mut self, port: Port, wait: WaitMode) -> Result<Option<Self::Buffer>>;
}
