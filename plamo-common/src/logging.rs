//! Tracing subscriber setup shared by PlamoScanner binaries

use tracing_subscriber::EnvFilter;

/// Initialize the global fmt subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. "info" or
/// "plamo_scanner=debug") is used. Calling this twice is harmless: the second
/// call leaves the first subscriber in place.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
