//! hopchain CLI.
//!
//! - `hopchain route` - print the route a destination would take
//! - `hopchain dial` - dial through the router and pipe stdin/stdout

use std::process::ExitCode;

use clap::Parser;
use hopchain::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
