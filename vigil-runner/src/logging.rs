//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber
///
/// `RUST_LOG` wins over `default_filter`. Safe to call more than once; later
/// calls leave the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("vigil_runner=debug");
        init_tracing("vigil_runner=info");
        tracing::info!("tracing initialized twice without panicking");
    }
}
