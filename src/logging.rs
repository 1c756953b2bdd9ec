use crate::config::TraceConfig;
use std::sync::Once;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

static SUBSCRIBER: Once = Once::new();

fn env_filter(directive: Option<&str>) -> EnvFilter {
    let from_env = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy()
    };
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!("ignoring log filter `{directive}`: {err}");
            from_env()
        }),
        None => from_env(),
    }
}

/// Sends `tracing` events to stderr. The configured filter takes precedence
/// over `RUST_LOG`; with neither set only warnings are shown.
pub fn init(config: &TraceConfig) {
    SUBSCRIBER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(config.log_filter.as_deref()))
            .with_writer(std::io::stderr)
            .without_time()
            .try_init();
    });
}
