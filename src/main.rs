use std::process::ExitCode;

use doroute::cli::run_cli;
use doroute::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: {e:#}");
    }

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "doroute failed");
            ExitCode::FAILURE
        }
    }
}
