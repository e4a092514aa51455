use eyre::{eyre, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Where the account and hospital services live.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the account service (required)
    pub account_service_url: String,
    /// Base URL of the hospital service (required)
    pub hospital_service_url: String,
    /// Per-request timeout in seconds (defaults to 10)
    pub timeout_seconds: Option<u64>,
}

impl DirectoryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let account_service_url = env::var("ACCOUNT_SERVICE_URL")
            .map_err(|_| eyre!("ACCOUNT_SERVICE_URL environment variable not set"))?;

        let hospital_service_url = env::var("HOSPITAL_SERVICE_URL")
            .map_err(|_| eyre!("HOSPITAL_SERVICE_URL environment variable not set"))?;

        let timeout_seconds = match env::var("DIRECTORY_TIMEOUT_SECONDS") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| eyre!("DIRECTORY_TIMEOUT_SECONDS must be a whole number of seconds"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            account_service_url: trim_base(account_service_url),
            hospital_service_url: trim_base(hospital_service_url),
            timeout_seconds,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
