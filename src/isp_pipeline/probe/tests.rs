use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use crate::isp_pipeline::common::{mmal_error, IspError, MmalStatus, Result};
use crate::isp_pipeline::component::{
    BufferFlags, IspBuffer, IspComponent, Port, SoftIsp, SoftIspConfig, WaitMode,
    ISP_COMPONENT_NAME,
};
use crate::isp_pipeline::format::PortFormat;
use crate::isp_pipeline::ppm::{ImageWriter, PlainPpmWriter};
use crate::isp_pipeline::probe::{CropBehaviour, IspProbe, ProbeConfig};

struct MockBuffer {
    data: Vec<u8>,
    length: usize,
    flags: BufferFlags,
}

impl IspBuffer for MockBuffer {
    fn capacity(&self) -> usize {
        self.data.len()
    }
    fn length(&self) -> usize {
        self.length
    }
    fn set_length(&mut self, length: usize) {
        self.length = length;
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

/// Records every call and answers with a fixed output length.
#[derive(Default)]
struct MockComponent {
    calls: Vec<String>,
    formats: Vec<(Port, PortFormat)>,
    output_buffers: usize,
    output_length: usize,
    fail_commit_on: Option<Port>,
    sent_input: Option<(usize, BufferFlags, bool)>,
}

impl IspComponent for MockComponent {
    type Buffer = MockBuffer;

    fn name(&self) -> &str {
        "mock.isp"
    }

    fn commit_format(&mut self, port: Port, format: &PortFormat) -> Result<()> {
        self.calls.push(format!("commit {}", port));
        if self.fail_commit_on == Some(port) {
            return Err(mmal_error!("mmal_port_format_commit", MmalStatus::EInval));
        }
        self.formats.push((port, *format));
        Ok(())
    }

    fn port_format(&self, port: Port) -> Option<PortFormat> {
        self.formats.iter().rev().find(|(p, _)| *p == port).map(|(_, f)| *f)
    }

    fn enable_port(&mut self, port: Port) -> Result<()> {
        self.calls.push(format!("enable {}", port));
        Ok(())
    }

    fn buffer_get_empty(&mut self, port: Port, _wait: WaitMode) -> Result<Option<MockBuffer>> {
        self.calls.push(format!("get_empty {}", port));
        let available = match port {
            Port::Output if self.output_buffers > 0 => {
                self.output_buffers -= 1;
                true
            }
            Port::Output => false,
            Port::Input => true,
        };
        Ok(available.then(|| MockBuffer {
            data: vec![0u8; 1 << 20],
            length: 0,
            flags: BufferFlags::empty(),
        }))
    }

    fn send_buffer(&mut self, port: Port, buffer: MockBuffer) -> Result<()> {
        self.calls.push(format!("send {}", port));
        if port == Port::Input {
            let all_filled = buffer.payload().iter().all(|&b| b == 0xFF);
            self.sent_input = Some((buffer.length, buffer.flags, all_filled));
        }
        Ok(())
    }

    fn buffer_get_full(&mut self, port: Port, wait: WaitMode) -> Result<Option<MockBuffer>> {
        self.calls.push(format!("get_full {} {:?}", port, wait));
        Ok(Some(MockBuffer {
            data: vec![7u8; self.output_length],
            length: self.output_length,
            flags: BufferFlags::EOS,
        }))
    }
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<(usize, usize, usize)>>>,
}

impl ImageWriter for MockWriter {
    fn write_rgb(&self, data: &[u8], width: usize, height: usize, _output: &mut dyn Write) -> Result<()> {
        if self.should_fail {
            return Err(IspError::OutputWriteError("Mock write error".to_string()));
        }
        self.written.lock().unwrap().push((data.len(), width, height));
        Ok(())
    }
}

fn mock_writer(should_fail: bool) -> (MockWriter, Arc<Mutex<Vec<(usize, usize, usize)>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    (MockWriter { should_fail, written: written.clone() }, written)
}

#[test]
fn test_config_builder() {
    let config = ProbeConfig::builder()
        .size(64, 32)
        .output_path("probe.ppm")
        .fill_byte(0x10)
        .assume_crop_ignored(true)
        .build();

    assert_eq!((config.input_width, config.input_height), (64, 32));
    assert_eq!((config.output_width, config.output_height), (64, 32));
    assert_eq!(config.output_path.to_str(), Some("probe.ppm"));
    assert_eq!(config.fill_byte, 0x10);
    assert!(config.assume_crop_ignored);
    assert_eq!(config.component_name, ISP_COMPONENT_NAME);
}

#[test]
fn test_default_config() {
    let config = ProbeConfig::default();

    assert_eq!((config.input_width, config.input_height), (592, 512));
    assert_eq!(config.input_encoding.to_string(), "pBAA");
    assert_eq!(config.output_encoding.to_string(), "RGB3");
    assert_eq!(config.output_path.to_str(), Some("out.ppm"));
    assert_eq!(config.fill_byte, 0xFF);
    assert!(!config.assume_crop_ignored);
}

#[test]
fn test_call_sequence() {
    let component = MockComponent {
        output_buffers: 2,
        output_length: 592 * 512 * 3,
        ..Default::default()
    };
    let (writer, written) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let report = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    let calls = &probe.component().calls;
    let expected = [
        "commit input[0]",
        "commit output[0]",
        "enable input[0]",
        "enable output[0]",
        "get_empty output[0]",
        "send output[0]",
        "get_empty output[0]",
        "send output[0]",
        "get_empty output[0]",
        "get_empty input[0]",
        "send input[0]",
        "get_full output[0] Wait",
    ];
    assert_eq!(calls.iter().map(String::as_str).collect::<Vec<_>>(), expected);

    assert_eq!(report.primed_output_buffers, 2);
    assert_eq!(report.crop_behaviour, CropBehaviour::Honoured);
    assert_eq!(written.lock().unwrap().as_slice(), &[(592 * 512 * 3, 592, 512)]);
}

#[test]
fn test_every_step_is_timed_in_order() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3,
        ..Default::default()
    };
    let (writer, _) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let report = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    let steps: Vec<_> = report.timings.iter().map(|(name, _)| name).collect();
    assert_eq!(
        steps,
        [
            "configure_input",
            "configure_output",
            "enable_input",
            "enable_output",
            "prime_output",
            "send_input",
            "wait_output",
            "save_image",
        ]
    );
    assert!(report.timings.slowest().is_some());
}

#[test]
fn test_input_frame_is_filled_and_flagged() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3,
        ..Default::default()
    };
    let (writer, _) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let report = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    assert_eq!(report.input_length, 768 * 512);
    let (length, flags, all_filled) = probe.component().sent_input.unwrap();
    assert_eq!(length, 768 * 512);
    assert!(flags.contains(BufferFlags::EOS));
    assert!(all_filled);
}

#[test]
fn test_ports_committed_with_aligned_frames() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3,
        ..Default::default()
    };
    let (writer, _) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());
    probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    for (_, format) in &probe.component().formats {
        assert_eq!((format.width, format.height), (608, 512));
        assert_eq!((format.crop.width, format.crop.height), (592, 512));
    }
}

#[test]
fn test_uncropped_output_detected() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 608 * 512 * 3,
        ..Default::default()
    };
    let (writer, written) = mock_writer(false);
    let config = ProbeConfig::builder().assume_crop_ignored(true).build();
    let mut probe = IspProbe::with_custom(component, writer, config);

    let report = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    assert_eq!(report.crop_behaviour, CropBehaviour::Ignored);
    assert_eq!(report.expected_cropped, 909_312);
    assert_eq!(report.expected_uncropped, 933_888);
    assert_eq!(report.saved_width, 608);
    assert_eq!(written.lock().unwrap()[0].1, 608);
}

#[test]
fn test_unexpected_output_length() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3 + 1,
        ..Default::default()
    };
    let (writer, _) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let report = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap();

    assert_eq!(report.crop_behaviour, CropBehaviour::Unexpected);
}

#[test]
fn test_commit_failure_stops_probe() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3,
        fail_commit_on: Some(Port::Output),
        ..Default::default()
    };
    let (writer, written) = mock_writer(false);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let err = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap_err();

    assert_eq!(err.status(), Some(MmalStatus::EInval));
    assert!(err.to_string().contains(":commit_format: mmal_port_format_commit: "));
    assert_eq!(probe.component().calls, vec!["commit input[0]", "commit output[0]"]);
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_writer_failure() {
    let component = MockComponent {
        output_buffers: 1,
        output_length: 592 * 512 * 3,
        ..Default::default()
    };
    let (writer, _) = mock_writer(true);
    let mut probe = IspProbe::with_custom(component, writer, ProbeConfig::default());

    let err = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap_err();

    assert!(matches!(err, IspError::OutputWriteError(_)));
}

#[test]
fn test_zero_size_rejected() {
    let (writer, _) = mock_writer(false);
    let config = ProbeConfig::builder().size(0, 16).build();
    let mut probe = IspProbe::with_custom(MockComponent::default(), writer, config);

    let err = probe.run_to_writer(&mut Cursor::new(Vec::new())).unwrap_err();

    assert!(matches!(err, IspError::InvalidDimensions(0, 16)));
    assert!(probe.component().calls.is_empty());
}

#[test]
fn test_software_isp_end_to_end() {
    let config = ProbeConfig::builder().size(40, 8).build();
    let mut probe = IspProbe::software(config).unwrap();
    let mut output = Vec::new();

    let report = probe.run_to_writer(&mut output).unwrap();

    assert_eq!(report.output_length, 40 * 8 * 3);
    assert_eq!(report.crop_behaviour, CropBehaviour::Honoured);
    assert_eq!(report.primed_output_buffers, 3);

    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("P3\n40 8\n255\n"));
    assert_eq!(text.lines().skip(3).count(), 40 * 8);
    assert!(text.lines().skip(3).all(|line| line == "255 255 255"));
}

#[test]
fn test_software_isp_ignoring_crop() {
    let config = ProbeConfig::builder().size(40, 8).assume_crop_ignored(true).build();
    let isp = SoftIsp::with_config(
        ISP_COMPONENT_NAME,
        SoftIspConfig { honours_crop: false, ..SoftIspConfig::default() },
    )
    .unwrap();
    let mut probe = IspProbe::with_custom(isp, PlainPpmWriter, config);
    let mut output = Vec::new();

    let report = probe.run_to_writer(&mut output).unwrap();

    assert_eq!(report.crop_behaviour, CropBehaviour::Ignored);
    assert_eq!(report.output_length, 64 * 8 * 3);

    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("P3\n64 8\n255\n"));
    // Padding columns come through as black
    assert_eq!(text.lines().nth(3 + 40), Some("0 0 0"));
    assert_eq!(text.lines().nth(3 + 64), Some("255 255 255"));
}
