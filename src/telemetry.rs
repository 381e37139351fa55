//! Logging initialization.
//!
//! Events go to stderr so stdout stays reserved for the output mapping.
//! `RUST_LOG` overrides everything; otherwise `--debug` turns on debug
//! events for the gitmit crates and anything else stays at `warn`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, before any work happens.
pub fn init(debug: bool) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let default = if debug {
        "warn,gitmit=debug,gitmit_git=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
