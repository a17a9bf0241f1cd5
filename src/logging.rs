//! tracing subscriber setup.
//!
//! `RUST_LOG` always wins. Otherwise verbosity comes from `-v` and the
//! config's `options.verbose`; run summaries (target `summary`) are shown
//! even when quiet.

use tracing_subscriber::EnvFilter;

fn default_directives(cli_verbose: u8, config_verbose: bool) -> &'static str {
    match cli_verbose {
        0 if config_verbose => "info",
        0 => "warn,summary=info",
        1 => "info",
        _ => "debug",
    }
}

pub fn init(cli_verbose: u8, config_verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(cli_verbose, config_verbose)));
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
