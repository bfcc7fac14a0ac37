//! Tally CLI entrypoint for contribution reports.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use tally::{ForgeError, OperationMode, TallyConfig};
use tracing_subscriber::EnvFilter;

use cli::CliError;

const DEFAULT_LOG_FILTER: &str = "tally=info";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ignored = writeln!(io::stderr().lock(), "{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let config = load_config()?;

    match config.operation_mode() {
        OperationMode::MigrateDatabase => cli::migrations::run(&config),
        OperationMode::ClearCache => {
            let cache = cli::cache::open(&config)?;
            let mut stdout = io::stdout().lock();
            cli::cache::clear(&config, &cache, &mut stdout)
        }
        OperationMode::Report => {
            let cache = cli::cache::open(&config)?;
            let mut stdout = io::stdout().lock();
            cli::report::run(&config, cache, &mut stdout).await
        }
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ForgeError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<TallyConfig, ForgeError> {
    TallyConfig::load().map_err(|error| ForgeError::Configuration {
        message: error.to_string(),
    })
}

/// Logs to stderr, filtered by `RUST_LOG` when set.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ignored = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
