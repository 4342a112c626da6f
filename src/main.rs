use std::process::ExitCode;

use anyhow::Context;
use vc_isp_probe_rs::isp_pipeline::{IspProbe, ProbeConfig, ProbeReport};
use vc_isp_probe_rs::logger;

use tracing::{error, info};

#[cfg(vc_mmal)]
fn run_probe(config: ProbeConfig) -> anyhow::Result<ProbeReport> {
    info!("Probing VideoCore ISP through MMAL");
    let component = config.component_name.clone();
    let mut probe = IspProbe::new(config)
        .with_context(|| format!("Failed to create {}", component))?;
    Ok(probe.run()?)
}

#[cfg(not(vc_mmal))]
fn run_probe(config: ProbeConfig) -> anyhow::Result<ProbeReport> {
    tracing::warn!("Built without MMAL, probing the software ISP instead");
    let component = config.component_name.clone();
    let mut probe = IspProbe::software(config)
        .with_context(|| format!("Failed to create software {}", component))?;
    Ok(probe.run()?)
}

fn main() -> ExitCode {
    logger::init();

    info!("Starting vc_isp_probe...");

    let config = ProbeConfig::default();
    info!(
        "Input: {} {}x{}, output: {} {}x{}",
        config.input_encoding,
        config.input_width,
        config.input_height,
        config.output_encoding,
        config.output_width,
        config.output_height
    );

    match run_probe(config) {
        Ok(report) => {
            report.log_summary();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Probe failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
