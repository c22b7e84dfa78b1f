//! Logging
//!
//! `tracing` subscriber with an `EnvFilter`; `RUST_LOG` wins over the
//! configured filter when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::EngineConfig;

pub fn filter_for(config: &EngineConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("lab_quality=info"))
}

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(config: &EngineConfig) {
    let _ = Registry::default()
        .with(filter_for(config))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        let config = EngineConfig {
            log_filter: "lab_quality=debug".into(),
            ..Default::default()
        };
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn test_bad_filter_falls_back() {
        let config = EngineConfig {
            log_filter: "[[[".into(),
            ..Default::default()
        };
        let _ = filter_for(&config);
    }
}
