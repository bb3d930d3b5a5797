use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::ConfigService;
use crate::interfaces::cli::{self, EXIT_ERROR, EXIT_USAGE};
use crate::interfaces::AppState;

pub fn run() {
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}\n\n{}", err, cli::HELP_TEXT);
            std::process::exit(EXIT_USAGE);
        }
    };

    let _ = dotenvy::dotenv();

    let config = match ConfigService::new().load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(EXIT_ERROR);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            tracing::error!(error = %err, "Failed to open activity log");
            eprintln!("Error: {}", err);
            std::process::exit(EXIT_ERROR);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            std::process::exit(EXIT_ERROR);
        }
    };

    let code = runtime.block_on(cli::execute(state, command));
    std::process::exit(code);
}
