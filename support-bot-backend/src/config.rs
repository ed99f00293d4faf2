use std::env;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const FRESHBOTS_API_URL: &str = "FRESHBOTS_API_URL";
    pub const FRESHBOTS_API_TOKEN: &str = "FRESHBOTS_API_TOKEN";
    pub const FRESHBOTS_TIMEOUT_SECS: &str = "FRESHBOTS_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/support_bot.db";
    pub const FRESHBOTS_API_URL: &str = "http://localhost:9090";
    pub const FRESHBOTS_TIMEOUT_SECS: u64 = 30;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub freshbots: FreshbotsConfig,
}

/// Connection settings for the external bot provisioning service
#[derive(Clone, Debug)]
pub struct FreshbotsConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            freshbots: FreshbotsConfig::from_env(),
        }
    }
}

impl FreshbotsConfig {
    pub fn from_env() -> Self {
        let api_token = env::var(env_vars::FRESHBOTS_API_TOKEN)
            .ok()
            .filter(|t| !t.is_empty());
        if api_token.is_none() {
            log::warn!(
                "{} not set - provisioning requests will be sent unauthenticated",
                env_vars::FRESHBOTS_API_TOKEN
            );
        }

        Self {
            base_url: env::var(env_vars::FRESHBOTS_API_URL)
                .unwrap_or_else(|_| defaults::FRESHBOTS_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_token,
            timeout: Duration::from_secs(
                env::var(env_vars::FRESHBOTS_TIMEOUT_SECS)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults::FRESHBOTS_TIMEOUT_SECS),
            ),
        }
    }
}
