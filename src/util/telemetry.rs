//! Telemetry helpers for structured logging.

/// Installs a default env-filter based tracing subscriber if none is set.
///
/// Applications embedding the queue will normally install their own
/// subscriber; this helper is for demos and tests, and is a no-op when a
/// dispatcher is already in place.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
