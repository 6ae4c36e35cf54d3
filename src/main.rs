//! Portfolio Site - binary entry point
//! Delegates to the library for all app logic.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match portfolio_site::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server stopped: {}", e);
            eprintln!("FATAL: {}", e);
            ExitCode::FAILURE
        }
    }
}
