pub mod isp_pipeline;
pub mod logger;
