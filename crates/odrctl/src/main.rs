//! odrctl - health check and remote control client for ODR-DabMod

use clap::Parser;
use odrctl::cli::Cli;
use odrctl::{errors, logging, output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match odrctl::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::display_error(&format!("{:#}", e));
            errors::exit_code_for(&e)
        }
    };
    std::process::exit(code);
}
