use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for a given `-v` count. `RUST_LOG` takes precedence.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "manifest_notify=info",
        1 => "manifest_notify=debug",
        _ => "manifest_notify=trace,reqwest=debug",
    }
}

/// Install the stderr subscriber. Stdout stays reserved for `--dry-run` output.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
