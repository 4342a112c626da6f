use std::fs::File;
use std::io::Write;

use tracing::{debug, info, instrument, warn};

use crate::isp_pipeline::{
    common::{mmal_error, IspError, MmalStatus, Result},
    component::{BufferFlags, IspBuffer, IspComponent, Port, SoftIsp, WaitMode},
    format::{align_up, expected_output_lengths, PortFormat},
    ppm::{ImageWriter, PlainPpmWriter},
    probe::{
        timing::StepTimings,
        types::{CropBehaviour, ProbeConfig, ProbeReport},
    },
};
#[cfg(vc_mmal)]
use crate::isp_pipeline::component::MmalIsp;

pub struct IspProbe<C: IspComponent, W: ImageWriter> {
    component: C,
    writer: W,
    config: ProbeConfig,
}

#[cfg(vc_mmal)]
impl IspProbe<MmalIsp, PlainPpmWriter> {
    /// Probe the VideoCore ISP through MMAL.
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let component = MmalIsp::create(&config.component_name)?;
        Ok(Self::with_custom(component, PlainPpmWriter, config))
    }
}

impl IspProbe<SoftIsp, PlainPpmWriter> {
    /// Probe the CPU emulation of the ISP.
    pub fn software(config: ProbeConfig) -> Result<Self> {
        let component = SoftIsp::create(&config.component_name)?;
        Ok(Self::with_custom(component, PlainPpmWriter, config))
    }
}

/// Runs one probe step inside its own span and records how long it took.
fn timed<T>(
    timings: &mut StepTimings,
    name: &'static str,
    step: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let _span = tracing::info_span!("probe_step", step = name).entered();
    timings.measure(name, step)
}

impl<C: IspComponent, W: ImageWriter> IspProbe<C, W> {
    pub fn with_custom(component: C, writer: W, config: ProbeConfig) -> Self {
        Self {
            component,
            writer,
            config,
        }
    }

    fn configure_port(&mut self, port: Port, format: &PortFormat) -> Result<()> {
        info!(
            "{}: {}: video:{}x{} video.crop:{}x{}",
            port,
            format.encoding,
            format.width,
            format.height,
            format.crop.width,
            format.crop.height
        );
        self.component.commit_format(port, format)
    }

    /// Pushes one synthetic frame through the component and writes the result to `output`.
    #[instrument(skip(self, output), fields(component = %self.component.name()))]
    pub fn run_to_writer(&mut self, output: &mut dyn Write) -> Result<ProbeReport> {
        let mut timings = StepTimings::new();
        let config = self.config.clone();

        let input_format =
            PortFormat::for_frame(config.input_encoding, config.input_width, config.input_height)?;
        let output_format =
            PortFormat::for_frame(config.output_encoding, config.output_width, config.output_height)?;

        timed(&mut timings, "configure_input", || self.configure_port(Port::Input, &input_format))?;
        timed(&mut timings, "configure_output", || self.configure_port(Port::Output, &output_format))?;
        timed(&mut timings, "enable_input", || self.component.enable_port(Port::Input))?;
        timed(&mut timings, "enable_output", || self.component.enable_port(Port::Output))?;

        let primed_output_buffers = timed(&mut timings, "prime_output", || {
            let mut primed = 0;
            while let Some(buffer) = self.component.buffer_get_empty(Port::Output, WaitMode::NoWait)? {
                self.component.send_buffer(Port::Output, buffer)?;
                primed += 1;
            }
            debug!("Primed output with {} buffers", primed);
            Ok(primed)
        })?;
        if primed_output_buffers == 0 {
            warn!("Output port gave no empty buffers to prime");
        }

        let input_length = timed(&mut timings, "send_input", || {
            let mut buffer = self
                .component
                .buffer_get_empty(Port::Input, WaitMode::NoWait)?
                .ok_or_else(|| mmal_error!("mmal_wrapper_buffer_get_empty", MmalStatus::EAgain))?;

            // Rows follow the stride of the frame the component accepted
            let committed = self.component.port_format(Port::Input).unwrap_or(input_format);
            let length = committed.stride() * committed.crop.height;
            if length > buffer.capacity() {
                return Err(IspError::BufferTooSmall {
                    needed: length,
                    available: buffer.capacity(),
                });
            }

            buffer.data_mut()[..length].fill(config.fill_byte);
            buffer.set_length(length);
            buffer.set_flags(BufferFlags::EOS);
            self.component.send_buffer(Port::Input, buffer)?;
            Ok(length)
        })?;

        let full = timed(&mut timings, "wait_output", || {
            self.component
                .buffer_get_full(Port::Output, WaitMode::Wait)?
                .ok_or_else(|| mmal_error!("mmal_wrapper_buffer_get_full", MmalStatus::EAgain))
        })?;

        let output_length = full.length();
        let (expected_cropped, expected_uncropped) =
            expected_output_lengths(config.output_width, config.output_height);
        let crop_behaviour =
            CropBehaviour::classify(output_length, expected_cropped, expected_uncropped);
        if crop_behaviour == CropBehaviour::Unexpected {
            warn!(
                "Output length {} matches neither {} nor {}",
                output_length, expected_cropped, expected_uncropped
            );
        }

        let saved_width = if config.assume_crop_ignored {
            let width = align_up(config.output_width, 32);
            info!("ISP ignores cropping setting; aligning width to {}", width);
            width
        } else {
            config.output_width
        };
        let saved_height = config.output_height;

        timed(&mut timings, "save_image", || {
            self.writer.write_rgb(full.payload(), saved_width, saved_height, output)
        })?;

        Ok(ProbeReport {
            output_length,
            expected_cropped,
            expected_uncropped,
            crop_behaviour,
            primed_output_buffers,
            input_length,
            saved_width,
            saved_height,
            output_path: None,
            timings,
        })
    }

    /// Runs the probe and saves the image to the configured output path.
    #[instrument(skip(self), fields(output = %self.config.output_path.display()))]
    pub fn run(&mut self) -> Result<ProbeReport> {
        let output_path = self.config.output_path.clone();

        let mut output_file = File::create(&output_path).map_err(|e| {
            IspError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;

        let mut report = self.run_to_writer(&mut output_file)?;

        output_file.sync_all().map_err(|e| {
            IspError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;

        report.output_path = Some(output_path);
        Ok(report)
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn component(&self) -> &C {
        &self.component
    }
}
