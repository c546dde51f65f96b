use tracing_subscriber::EnvFilter;

/// Default filter: our own crates at `info`, llama.cpp bindings only when they warn.
const DEFAULT_FILTER: &str = "info,llama_cpp_2=warn";

/// Initialize tracing to stderr, keeping stdout for generation results.
///
/// Set `RUST_LOG=debug` for verbose output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();
}

pub fn log_startup() {
    tracing::info!("textgen {} starting", env!("CARGO_PKG_VERSION"));
}

pub fn log_shutdown() {
    tracing::info!("textgen finished");
}
