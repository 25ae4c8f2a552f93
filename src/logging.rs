use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Honors `RUST_LOG`; defaults to
/// info-level output for this crate plus request traces.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "appointr_messaging=info,tower_http=info".parse().expect("valid default filter")
        }))
        .init();
}
