//! # Telemetry
//!
//! Tracing initialization shared by binaries and test harnesses.

use tracing::info;

use crate::config::TelemetryConfig;

/// Initialize tracing output for the current process
///
/// The filter comes from `RUST_LOG` when set, otherwise from the configured
/// level. Fails when a global subscriber is already installed; callers
/// running under a shared test harness may ignore that error.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_target(false))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .try_init()?;
        }
    }

    info!("Telemetry initialized with console logging");
    Ok(())
}
