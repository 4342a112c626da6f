//! CPU emulation of the VideoCore ISP as seen through the component wrapper.
//!
//! Ports must be configured and enabled before buffers flow. An input buffer
//! sent to the component is converted into the next output buffer the caller
//! has queued; if none is queued yet the input waits for one. Failures report
//! the same status codes the firmware would.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::isp_pipeline::common::{mmal_error, IspError, MmalStatus, Result};
use crate::isp_pipeline::component::isp_component::IspComponent;
use crate::isp_pipeline::component::types::{BufferFlags, IspBuffer, Port, WaitMode};
use crate::isp_pipeline::component::ISP_COMPONENT_NAME;
use crate::isp_pipeline::debayer::{BayerPlane, CpuDebayer};
use crate::isp_pipeline::format::{unpack_raw10, unpack_raw16, unpack_raw8, Encoding, PortFormat};

#[derive(Debug, Clone)]
pub struct SoftIspConfig {
    /// Buffers allocated when the input port is enabled
    pub input_buffers: usize,
    /// Buffers allocated when the output port is enabled
    pub output_buffers: usize,
    /// Emit tightly packed crop-sized rows. When false, rows span the
    /// aligned frame width, like firmware that ignores the crop.
    pub honours_crop: bool,
}

impl Default for SoftIspConfig {
    fn default() -> Self {
        Self {
            input_buffers: 1,
            output_buffers: 3,
            honours_crop: true,
        }
    }
}

#[derive(Debug)]
pub struct SoftBuffer {
    port: Port,
    data: Vec<u8>,
    length: usize,
    flags: BufferFlags,
}

impl IspBuffer for SoftBuffer {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn length(&self) -> usize {
        self.length
    }

    fn set_length(&mut self, length: usize) {
        self.length = length.min(self.data.len());
    }

    fn payload(&self) -> &[u8] {
        &self.data[..self.length]
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn flags(&self) -> BufferFlags {
        self.flags
    }

    fn set_flags(&mut self, flags: BufferFlags) {
        self.flags = flags;
    }
}

#[derive(Debug, Default)]
struct PortState {
    format: Option<PortFormat>,
    enabled: bool,
    /// Empty buffers available to the client
    free: Vec<SoftBuffer>,
    /// Buffers sent by the client, not yet consumed
    queued: VecDeque<SoftBuffer>,
    /// Filled buffers waiting for the client
    full: VecDeque<SoftBuffer>,
}

pub struct SoftIsp {
    name: String,
    config: SoftIspConfig,
    input: PortState,
    output: PortState,
    debayer: CpuDebayer,
}

impl SoftIsp {
    pub fn create(name: &str) -> Result<Self> {
        Self::with_config(name, SoftIspConfig::default())
    }

    pub fn with_config(name: &str, config: SoftIspConfig) -> Result<Self> {
        if name != ISP_COMPONENT_NAME {
            warn!("Software ISP cannot emulate component {}", name);
            return Err(mmal_error!("mmal_wrapper_create", MmalStatus::ENoEnt));
        }
        info!(
            "Created software ISP (input buffers: {}, output buffers: {}, honours crop: {})",
            config.input_buffers, config.output_buffers, config.honours_crop
        );
        Ok(Self {
            name: name.to_string(),
            config,
            input: PortState::default(),
            output: PortState::default(),
            debayer: CpuDebayer::new(),
        })
    }

    pub fn config(&self) -> &SoftIspConfig {
        &self.config
    }

    fn state(&self, port: Port) -> &PortState {
        match port {
            Port::Input => &self.input,
            Port::Output => &self.output,
        }
    }

    fn state_mut(&mut self, port: Port) -> &mut PortState {
        match port {
            Port::Input => &mut self.input,
            Port::Output => &mut self.output,
        }
    }

    /// Pairs pending input with queued output buffers until one side runs dry.
    fn process_pending(&mut self) -> Result<()> {
        while !self.input.queued.is_empty() && !self.output.queued.is_empty() {
            let (Some(mut input), Some(mut output)) =
                (self.input.queued.pop_front(), self.output.queued.pop_front())
            else {
                break;
            };

            let length = match self.convert(input.payload(), output.data_mut()) {
                Ok(length) => length,
                Err(e) => {
                    // The frame is lost but both buffers stay usable, the output first in line
                    recycle(&mut input);
                    self.input.free.push(input);
                    self.output.queued.push_front(output);
                    return Err(e);
                }
            };
            output.length = length;
            output.flags = BufferFlags::FRAME_END | eos_of(input.flags);
            debug!("Converted {} input bytes into {} output bytes", input.length, length);

            self.output.full.push_back(output);

            recycle(&mut input);
            self.input.free.push(input);
        }
        Ok(())
    }

    fn convert(&self, payload: &[u8], out: &mut [u8]) -> Result<usize> {
        let (Some(in_format), Some(out_format)) = (self.input.format, self.output.format) else {
            return Err(mmal_error!("mmal_port_send_buffer", MmalStatus::EConfig));
        };
        let Encoding::Bayer { order, bits, packed } = in_format.encoding else {
            return Err(mmal_error!("mmal_port_send_buffer", MmalStatus::EInval));
        };

        let in_crop = in_format.crop;
        let out_crop = out_format.crop;
        if (in_crop.width, in_crop.height) != (out_crop.width, out_crop.height) {
            warn!(
                "Software ISP does not resize ({}x{} -> {}x{})",
                in_crop.width, in_crop.height, out_crop.width, out_crop.height
            );
            return Err(mmal_error!("mmal_port_send_buffer", MmalStatus::EInval));
        }

        // Unpack from the frame origin to the far corner of the crop, then cut the crop out
        let span_width = in_crop.x + in_crop.width;
        let span_height = in_crop.y + in_crop.height;
        let stride = in_format.stride();
        let span = match (bits, packed) {
            (10, true) => unpack_raw10(payload, stride, span_width, span_height)?,
            (16, false) => unpack_raw16(payload, stride, span_width, span_height)?,
            _ => unpack_raw8(payload, stride, span_width, span_height)?,
        };
        let samples: Vec<u16> = span
            .chunks_exact(span_width)
            .skip(in_crop.y)
            .flat_map(|row| row[in_crop.x..].iter().copied())
            .collect();

        let plane = BayerPlane {
            width: in_crop.width,
            height: in_crop.height,
            order: order.shifted(in_crop.x, in_crop.y),
            bits,
            samples,
        };
        let rgb = self
            .debayer
            .process(&plane)
            .map_err(|e| IspError::Debayer(e.to_string()))?;

        let row_pixels = if self.config.honours_crop {
            out_crop.width
        } else {
            out_format.width
        };
        let out_stride = row_pixels * 3;
        let length = out_stride * out_crop.height;
        if out.len() < length {
            return Err(IspError::BufferTooSmall { needed: length, available: out.len() });
        }

        let swap = matches!(out_format.encoding, Encoding::Bgr24);
        for (y, src_row) in rgb.data.chunks_exact(rgb.width * 3).enumerate() {
            let dst_row = &mut out[y * out_stride..(y + 1) * out_stride];
            let (pixels, padding) = dst_row.split_at_mut(src_row.len());
            for (dst, src) in pixels.chunks_exact_mut(3).zip(src_row.chunks_exact(3)) {
                if swap {
                    dst.copy_from_slice(&[src[2], src[1], src[0]]);
                } else {
                    dst.copy_from_slice(src);
                }
            }
            padding.fill(0);
        }

        Ok(length)
    }
}

fn recycle(buffer: &mut SoftBuffer) {
    buffer.length = 0;
    buffer.flags = BufferFlags::empty();
}

fn eos_of(flags: BufferFlags) -> BufferFlags {
    if flags.contains(BufferFlags::EOS) {
        BufferFlags::EOS
    } else {
        BufferFlags::empty()
    }
}

impl IspComponent for SoftIsp {
    type Buffer = SoftBuffer;

    fn name(&self) -> &str {
        &self.name
    }

    fn commit_format(&mut self, port: Port, format: &PortFormat) -> Result<()> {
        format.validate()?;

        let acceptable = match port {
            Port::Input => format.encoding.is_bayer(),
            Port::Output => matches!(format.encoding, Encoding::Rgb24 | Encoding::Bgr24),
        };
        if !acceptable {
            warn!("{} cannot take encoding {}", port, format.encoding);
            return Err(mmal_error!("mmal_port_format_commit", MmalStatus::EInval));
        }

        let state = self.state_mut(port);
        if state.enabled {
            return Err(mmal_error!("mmal_port_format_commit", MmalStatus::EIsConn));
        }
        state.format = Some(*format);
        Ok(())
    }

    fn port_format(&self, port: Port) -> Option<PortFormat> {
        self.state(port).format
    }

    fn enable_port(&mut self, port: Port) -> Result<()> {
        let count = match port {
            Port::Input => self.config.input_buffers,
            Port::Output => self.config.output_buffers,
        };
        let state = self.state_mut(port);
        if state.enabled {
            return Err(mmal_error!("mmal_wrapper_port_enable", MmalStatus::EIsConn));
        }
        let Some(format) = state.format else {
            return Err(mmal_error!("mmal_wrapper_port_enable", MmalStatus::EConfig));
        };

        let size = format.buffer_size();
        state.free = (0..count)
            .map(|_| SoftBuffer {
                port,
                data: vec![0u8; size],
                length: 0,
                flags: BufferFlags::empty(),
            })
            .collect();
        state.enabled = true;
        debug!("Enabled {} with {} buffers of {} bytes", port, count, size);
        Ok(())
    }

    fn buffer_get_empty(&mut self, port: Port, wait: WaitMode) -> Result<Option<SoftBuffer>> {
        let state = self.state_mut(port);
        if !state.enabled {
            return Err(mmal_error!("mmal_wrapper_buffer_get_empty", MmalStatus::ENotConn));
        }
        match state.free.pop() {
            Some(buffer) => Ok(Some(buffer)),
            // Nothing else runs, so waiting would never end
            None if wait == WaitMode::Wait => {
                Err(mmal_error!("mmal_wrapper_buffer_get_empty", MmalStatus::EAgain))
            }
            None => Ok(None),
        }
    }

    fn send_buffer(&mut self, port: Port, buffer: SoftBuffer) -> Result<()> {
        if buffer.port != port {
            return Err(mmal_error!("mmal_port_send_buffer", MmalStatus::EInval));
        }
        let state = self.state_mut(port);
        if !state.enabled {
            return Err(mmal_error!("mmal_port_send_buffer", MmalStatus::ENotConn));
        }
        state.queued.push_back(buffer);
        self.process_pending()
    }

    fn buffer_get_full(&mut self, port: Port, wait: WaitMode) -> Result<Option<SoftBuffer>> {
        let state = self.state_mut(port);
        if !state.enabled {
            return Err(mmal_error!("mmal_wrapper_buffer_get_full", MmalStatus::ENotConn));
        }
        match state.full.pop_front() {
            Some(buffer) => Ok(Some(buffer)),
            None if wait == WaitMode::Wait => {
                warn!("No full buffer on {} and nothing pending to produce one", port);
                Err(mmal_error!("mmal_wrapper_buffer_get_full", MmalStatus::EAgain))
            }
            None => Ok(None),
        }
    }
}
