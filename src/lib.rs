pub mod app;
pub mod config;
pub mod database;
mod error;
pub mod model;
pub mod newsletter;
pub mod redis_manager;
pub mod templ_manager;
pub mod utils;
pub mod web;

// re-exports
pub use app::{App, AppState};
pub use web::serve;
pub use error::{Error, Result};

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Tracing setup for debug builds and tests.
/// Compact output without timestamps, filtered by `RUST_LOG` (defaults to `debug`).
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .compact()
        .init();
}

/// Tracing setup for release builds.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
