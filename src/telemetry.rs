//! Tracing subscriber setup for hosts embedding the editing core.
//!
//! The core itself only emits `tracing` events; installing a subscriber is
//! the host's choice. `init_tracing` wires the conventional stack (env
//! filter, fmt layer, error-context layer) for hosts that do not already
//! have one.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global tracing subscriber with env-filter control.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Calling this when a
/// subscriber is already installed is a no-op rather than an error, so
/// embedding hosts and tests can both call it unconditionally.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init();
}
