//! Logging initialization.
//!
//! Components log through `tracing` macros with structured fields; this
//! module installs the subscriber that renders them. Embedders that bring
//! their own subscriber simply skip [`init_logging`].

use tracing_subscriber::EnvFilter;

/// Install the default log subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_directive` (e.g. `"nearfeed=info"`). Returns `false` when a
/// global subscriber was already installed, which is harmless - the
/// existing subscriber keeps receiving events.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
