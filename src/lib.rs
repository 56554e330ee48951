pub mod batch;
pub mod chart;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod render;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() {
    init_tracing();
    let cli = cli::Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = cli::execute(&cli) {
        tracing::error!(error = %e, "chartsmith failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
