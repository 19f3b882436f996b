use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::logger::Logger;

mod commands;
mod config;
mod logger;

/// Environment variable holding the diagnostics filter.
const LOG_ENV: &str = "MAESTRO_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = match config::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // `--help` and `--version` surface as errors printed to stdout.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut logger = Logger::stdout();

    let command = match cli.command.into_supervisor_command() {
        Ok(command) => command,
        Err(name) => {
            logger.error(&format!("Specify a service to {name} or 'all'"));
            return ExitCode::FAILURE;
        }
    };

    match commands::control(cli.file, cli.state_file, command, &mut logger).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            logger.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}
