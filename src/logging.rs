use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; per-gesture
/// recognition logs live at `debug` and are enabled via the config's
/// `debug_logging` flag.
pub fn init(debug: bool) {
    // With debug logging off we force `info` regardless of `RUST_LOG`
    // so a stray environment variable cannot flood the output with one
    // line per pointer sample.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
