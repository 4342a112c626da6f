use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or does not parse.
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(step_span_events(&env_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Step spans report their duration on close once the filter lets debug output through.
fn step_span_events(filter: &EnvFilter) -> FmtSpan {
    match filter.max_level_hint() {
        Some(level) if level >= LevelFilter::DEBUG => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_hides_span_events() {
        assert_eq!(step_span_events(&EnvFilter::new(DEFAULT_FILTER)), FmtSpan::NONE);
        assert_eq!(step_span_events(&EnvFilter::new("off")), FmtSpan::NONE);
    }

    #[test]
    fn test_debug_filters_close_spans() {
        assert_eq!(step_span_events(&EnvFilter::new("debug")), FmtSpan::CLOSE);
        assert_eq!(step_span_events(&EnvFilter::new("warn,isp_pipeline=trace")), FmtSpan::CLOSE);
    }
}
