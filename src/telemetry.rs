use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::configuration::LogSettings;

/// Initialises structured logging.
/// `RUST_LOG` takes precedence over the configured filter; output is JSON
/// unless `log.json` is false.
pub fn init_telemetry(settings: &LogSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if settings.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("telemetry already initialised: {}", e);
    }
}
