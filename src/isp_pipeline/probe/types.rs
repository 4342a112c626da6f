//! Probe configuration and report types

use std::path::PathBuf;

use tracing::info;

use crate::isp_pipeline::component::ISP_COMPONENT_NAME;
use crate::isp_pipeline::constants::{
    INPUT_FILL_BYTE, ISP_IGNORES_CROPPING, ISP_IN_ENCODING, ISP_IN_HEIGHT, ISP_IN_WIDTH,
    ISP_OUT_ENCODING, ISP_OUT_HEIGHT, ISP_OUT_WIDTH, OUTPUT_FILE,
};
use crate::isp_pipeline::format::Encoding;
use crate::isp_pipeline::probe::timing::StepTimings;

/// Configuration for one probe run
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// MMAL component to create
    pub component_name: String,
    pub input_encoding: Encoding,
    pub output_encoding: Encoding,
    pub input_width: usize,
    pub input_height: usize,
    pub output_width: usize,
    pub output_height: usize,
    /// Where the PPM image is written
    pub output_path: PathBuf,
    /// Byte the synthetic input frame is filled with
    pub fill_byte: u8,
    /// Save with the 32-aligned width, for firmware that does not crop
    pub assume_crop_ignored: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            component_name: ISP_COMPONENT_NAME.to_string(),
            input_encoding: ISP_IN_ENCODING,
            output_encoding: ISP_OUT_ENCODING,
            input_width: ISP_IN_WIDTH,
            input_height: ISP_IN_HEIGHT,
            output_width: ISP_OUT_WIDTH,
            output_height: ISP_OUT_HEIGHT,
            output_path: PathBuf::from(OUTPUT_FILE),
            fill_byte: INPUT_FILL_BYTE,
            assume_crop_ignored: ISP_IGNORES_CROPPING,
        }
    }
}

impl ProbeConfig {
    pub fn builder() -> ProbeConfigBuilder {
        ProbeConfigBuilder::default()
    }
}

/// Builder for ProbeConfig
#[derive(Default)]
pub struct ProbeConfigBuilder {
    component_name: Option<String>,
    input_encoding: Option<Encoding>,
    output_encoding: Option<Encoding>,
    input_size: Option<(usize, usize)>,
    output_size: Option<(usize, usize)>,
    output_path: Option<PathBuf>,
    fill_byte: Option<u8>,
    assume_crop_ignored: Option<bool>,
}

impl ProbeConfigBuilder {
    pub fn component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self
    }

    pub fn input_encoding(mut self, encoding: Encoding) -> Self {
        self.input_encoding = Some(encoding);
        self
    }

    pub fn output_encoding(mut self, encoding: Encoding) -> Self {
        self.output_encoding = Some(encoding);
        self
    }

    pub fn input_size(mut self, width: usize, height: usize) -> Self {
        self.input_size = Some((width, height));
        self
    }

    pub fn output_size(mut self, width: usize, height: usize) -> Self {
        self.output_size = Some((width, height));
        self
    }

    /// Sets input and output to the same size.
    pub fn size(self, width: usize, height: usize) -> Self {
        self.input_size(width, height).output_size(width, height)
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn fill_byte(mut self, byte: u8) -> Self {
        self.fill_byte = Some(byte);
        self
    }

    pub fn assume_crop_ignored(mut self, ignored: bool) -> Self {
        self.assume_crop_ignored = Some(ignored);
        self
    }

    pub fn build(self) -> ProbeConfig {
        let default = ProbeConfig::default();
        let (input_width, input_height) = self
            .input_size
            .unwrap_or((default.input_width, default.input_height));
        let (output_width, output_height) = self
            .output_size
            .unwrap_or((default.output_width, default.output_height));
        ProbeConfig {
            component_name: self.component_name.unwrap_or(default.component_name),
            input_encoding: self.input_encoding.unwrap_or(default.input_encoding),
            output_encoding: self.output_encoding.unwrap_or(default.output_encoding),
            input_width,
            input_height,
            output_width,
            output_height,
            output_path: self.output_path.unwrap_or(default.output_path),
            fill_byte: self.fill_byte.unwrap_or(default.fill_byte),
            assume_crop_ignored: self.assume_crop_ignored.unwrap_or(default.assume_crop_ignored),
        }
    }
}

/// How the component treated the output crop, judged from the buffer length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropBehaviour {
    /// Rows are crop-width, tightly packed
    Honoured,
    /// Rows span the aligned frame width
    Ignored,
    /// Matches neither expectation
    Unexpected,
}

impl CropBehaviour {
    pub fn classify(length: usize, cropped: usize, uncropped: usize) -> Self {
        if length == cropped {
            CropBehaviour::Honoured
        } else if length == uncropped {
            CropBehaviour::Ignored
        } else {
            CropBehaviour::Unexpected
        }
    }
}

/// Outcome of a successful probe run
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Bytes the component put in the output buffer
    pub output_length: usize,
    /// Expected length if the component honours the crop
    pub expected_cropped: usize,
    /// Expected length if it returns full aligned rows
    pub expected_uncropped: usize,
    pub crop_behaviour: CropBehaviour,
    /// Output buffers handed to the component before the input was sent
    pub primed_output_buffers: usize,
    /// Bytes of synthetic input sent
    pub input_length: usize,
    /// Width written to the PPM header
    pub saved_width: usize,
    pub saved_height: usize,
    pub output_path: Option<PathBuf>,
    pub timings: StepTimings,
}

impl ProbeReport {
    pub fn log_summary(&self) {
        info!("Output header length is {}", self.output_length);
        info!("    If ISP correctly does cropping, this should be {}", self.expected_cropped);
        info!("    Otherwise, this should be {}", self.expected_uncropped);
        info!("Crop behaviour: {:?}", self.crop_behaviour);
        info!("Step timings:");
        self.timings.log_summary();
        if let Some(path) = &self.output_path {
            info!("Saved image to {}", path.display());
        }
    }
}
