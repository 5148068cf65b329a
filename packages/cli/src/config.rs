//! Environment configuration for the query binary.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub drive_access_token: String,
    pub drive_root_folder_id: Option<String>,
    pub nominatim_base_url: Option<String>,
    pub nominatim_user_agent: String,
    pub table_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            drive_access_token: env::var("DRIVE_ACCESS_TOKEN")
                .context("DRIVE_ACCESS_TOKEN must be set")?,
            drive_root_folder_id: env::var("DRIVE_ROOT_FOLDER_ID").ok(),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL").ok(),
            nominatim_user_agent: env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| "realprice-radius-query/0.1".to_string()),
            table_cache_ttl_secs: env::var("TABLE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("TABLE_CACHE_TTL_SECS must be a valid number")?,
        })
    }
}
