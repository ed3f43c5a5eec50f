mod config;

pub use config::{LogFormat, TelemetryConfig};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr so command output stays clean.
pub fn init_tracing() {
    init_with(&TelemetryConfig::from_env());
}

pub fn init_with(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new("oasguard=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.with_target)
        .with_writer(std::io::stderr);

    // a second init (e.g. from tests) keeps the first subscriber
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.with_line_number(true).try_init(),
    };

    if result.is_ok() {
        tracing::debug!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    }
}
