//! CLI for rfq
//!
//! Results go to stdout, diagnostics to stderr; any failure exits with 1.

use std::process::ExitCode;

use clap::Parser;
use rfq::cli::{self, Cli};
use rfq::utils::logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result = cli::run(cli, &mut std::io::stdout()).await;
    if let Err(e) = &result {
        error!("{e}");
    }
    ExitCode::from(cli::exit_code(&result))
}
