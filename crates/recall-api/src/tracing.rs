//! Tracing and logging configuration for the service
//!
//! Development gets pretty, human-readable output; production gets
//! flattened JSON suited to log aggregation. `RUST_LOG` overrides the
//! default filter in both cases (e.g. `RUST_LOG=debug,recall_db=trace`).

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const DEVELOPMENT_FILTER: &str = "debug,tower_http=debug,sqlx=warn";
const PRODUCTION_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Initialize tracing/logging based on the environment
pub fn init_tracing(env: &Environment) {
    let default_filter = if env.is_development() {
        DEVELOPMENT_FILTER
    } else {
        PRODUCTION_FILTER
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = if env.is_development() {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .pretty()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .flatten_event(true)
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .init();

    tracing::info!(environment = ?env, "tracing initialized");
}
