use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ARC_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Diagnostics go to stderr so stdout stays clean for table/JSON output.
/// `ARC_LOG` takes `EnvFilter` directives, e.g. `winter_arc=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
