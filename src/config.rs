use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Which `RestaurantStore` backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::InvalidConfig(format!(
                "STORE_BACKEND must be \"redis\" or \"memory\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub restaurants_key: String,
    /// Trim search results down to the menu items matching the coupon code.
    pub project_menu_items: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let addr = format!("{}:{}", var("HOST", "127.0.0.1"), var("PORT", "3000"));
        let addr = SocketAddr::from_str(&addr)
            .map_err(|_| AppError::InvalidConfig(format!("invalid listen address {}", addr)))?;

        Ok(Self {
            addr,
            store_backend: var("STORE_BACKEND", "redis").parse()?,
            redis_url: var("REDIS_URL", "redis://127.0.0.1/"),
            restaurants_key: var("RESTAURANTS_KEY", "restaurants"),
            project_menu_items: parse_flag(
                "SEARCH_PROJECT_MENU_ITEMS",
                &var("SEARCH_PROJECT_MENU_ITEMS", "false"),
            )?,
        })
    }
}

fn parse_flag(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AppError::InvalidConfig(format!(
            "{} must be a boolean, got \"{}\"",
            name, value
        ))),
    }
}
