//! Server configuration, loaded once from the environment at startup.

use std::env;

pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub alchemy_prices_api_key: String,
    pub alchemy_api_key_ethereum: String,
    pub alchemy_api_key_polygon: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env_or("LISTEN_ADDR", "0.0.0.0:4000"),
            database_url: env_or("DATABASE_URL", "chainprice.db"),
            alchemy_prices_api_key: env_or("ALCHEMY_PRICES_API_KEY", ""),
            alchemy_api_key_ethereum: env_or("ALCHEMY_API_KEY_ETHEREUM", ""),
            alchemy_api_key_polygon: env_or("ALCHEMY_API_KEY_POLYGON", ""),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
