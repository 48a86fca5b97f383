//! Battant CLI

use std::process;

use clap::Parser;

mod cli;

#[tokio::main]
pub async fn main() {
    battant_app::config::load_dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = battant_app::logging::init(cli.logging()) {
        eprintln!("failed to initialise logging: {error}");
    }

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
