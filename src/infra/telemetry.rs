use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
