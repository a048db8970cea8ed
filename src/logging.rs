use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable read when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "SITECHECK_LOGLEVEL";

/// Installs a stderr subscriber so reports on stdout stay machine-readable.
///
/// The filter comes from `RUST_LOG`, then `SITECHECK_LOGLEVEL`, then
/// `sitecheck=info` (`sitecheck=debug` when verbose is on).
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV))
        .unwrap_or_else(|_| format!("{}={}", env!("CARGO_CRATE_NAME"), default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(stderr_layer)
        .try_init();
}
