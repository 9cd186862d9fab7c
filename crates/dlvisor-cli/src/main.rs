use std::process::ExitCode;

use dlvisor_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout belongs to the status screen, so logs go to a file when possible.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dlvisor error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
