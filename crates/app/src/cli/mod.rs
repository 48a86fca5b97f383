use battant::changes::Payload;
use battant_app::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
};
use clap::{Parser, Subcommand};

mod cart;
mod changes;
mod remote;
mod render;

#[derive(Debug, Parser)]
#[command(
    name = "battant",
    about = "La Marque Du Battant cart and content admin",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and edit the shopping cart
    Cart(cart::CartCommand),

    /// Queue, inspect and apply pending admin changes
    Changes(changes::ChangesCommand),

    /// Read or write remote rows immediately, bypassing the queue
    Remote(remote::RemoteCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::from_config(&self.config)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Cart(command) => cart::run(&context, command),
            Commands::Changes(command) => changes::run(&context, command).await,
            Commands::Remote(command) => remote::run(&context, command).await,
        }
    }
}

/// Parse a JSON object given on the command line.
fn parse_payload(raw: &str) -> Result<Payload, String> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(payload)) => Ok(payload),
        Ok(_) => Err("payload must be a JSON object".to_string()),
        Err(error) => Err(format!("invalid JSON: {error}")),
    }
}
