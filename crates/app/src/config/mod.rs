//! Application configuration

use std::{path::PathBuf, time::Duration};

use clap::Args;
use url::Url;

pub mod observability;

pub use observability::{LogFormat, LoggingConfig};

/// Where local state lives and which API to talk to.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Directory holding the cart and pending changes
    #[arg(long, env = "BATTANT_DATA_DIR", default_value = ".battant")]
    pub data_dir: PathBuf,

    /// Base URL of the shop's JSON API
    #[arg(long, env = "BATTANT_API_URL", default_value = "http://localhost:3000")]
    pub api_url: Url,

    /// Timeout applied to every API request, in seconds
    #[arg(long, env = "BATTANT_REQUEST_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub request_timeout_seconds: u64,
}

impl AppConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Load `.env` if present. Missing files are ignored.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
