#![allow(missing_docs)]

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs always go to stderr so that stdout
/// carries nothing but encoded events.
pub fn init(color: bool, json: bool, levels: &str) {
    let builder = tracing_subscriber::fmt()
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(levels));

    // Tests and embedders may already have installed a subscriber.
    let _ = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
}
