//! # Sparks Back Office Entry Point
//!
//! ## Startup Sequence
//! 1. Load configuration
//! 2. Initialize tracing (logging)
//! 3. Connect to database & run migrations
//! 4. Bind the registry and report readiness

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for better testability
    match sparks_backoffice::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sparks-backoffice: {}", err);
            ExitCode::FAILURE
        }
    }
}
