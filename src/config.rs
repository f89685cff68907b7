use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://class-reminder-backend.onrender.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub bind_addr: SocketAddr,
    pub notifications_enabled: bool,
}

impl Config {
    /// Reads the configuration from the process environment (after loading `.env`, if any).
    pub fn new_from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CLASS_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim_end_matches('/').to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "CLASS_API_URL must be an http(s) url, got {}",
                api_url
            )));
        }

        let api_token = lookup("CLASS_API_TOKEN").filter(|v| !v.trim().is_empty());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let notifications_enabled = match lookup("NOTIFICATIONS_ENABLED") {
            None => true,
            Some(v) => parse_bool(&v).ok_or_else(|| {
                AppError::Config(format!("NOTIFICATIONS_ENABLED must be a boolean, got {}", v))
            })?,
        };

        Ok(Self {
            api_url,
            api_token,
            bind_addr,
            notifications_enabled,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
