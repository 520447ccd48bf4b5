//! Logging initialization

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `-v`.
///
/// The library crates log through the `log` facade; the subscriber's
/// `tracing-log` bridge picks those records up.
pub fn init(verbose: u8) {
    let default_directive = match verbose {
        0 => "info",
        1 => "info,rsm_cli=debug,rsm_compiler=debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = fmt()
        .with_env_filter(env_filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}
