use anyhow::Result;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::metrics;

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    /// Prometheus registry plus the global tracing subscriber.
    ///
    /// `LOG_FORMAT=json` switches the fmt layer to JSON lines.
    pub fn init() -> Result<Self> {
        let registry = metrics::registry()?;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "librarian_api=debug,librarian_core=debug,tower_http=debug".into());

        let json = std::env::var("LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let subscriber = tracing_subscriber::registry().with(env_filter);
        if json {
            subscriber.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            subscriber.with(tracing_subscriber::fmt::layer()).init();
        }

        tracing::info!("Observability stack initialized (Prometheus at /metrics)");
        Ok(Self { registry })
    }
}
