use std::env;
use anyhow::{Context, Result};

pub const DEFAULT_FEATURE: &str = "background_red";

#[derive(Debug, Clone)]
pub struct Config {
    pub service_port: u16,
    pub service_host: String,
    pub server_url: String,
    pub feature: String,
    pub state_file: Option<String>,
}

fn service_port_from_env() -> Result<u16> {
    env::var("SERVICE_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("SERVICE_PORT must be a valid port number (0-65535)")
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let service_port = service_port_from_env()?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_url = env::var("FLIPPY_SERVER_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}", service_port));

        let feature = env::var("FLIPPY_FEATURE")
            .unwrap_or_else(|_| DEFAULT_FEATURE.to_string());
        anyhow::ensure!(!feature.is_empty(), "FLIPPY_FEATURE must not be empty");

        let state_file = env::var("FLIPPY_STATE_FILE").ok();

        Ok(Config {
            service_port,
            service_host,
            server_url,
            feature,
            state_file,
        })
    }

    /// Server URL for the client side alone
    ///
    /// Only reads `SERVICE_PORT` when `FLIPPY_SERVER_URL` is unset, so
    /// server-only settings can't break the client.
    pub fn server_url_from_env() -> Result<String> {
        match env::var("FLIPPY_SERVER_URL") {
            Ok(url) => Ok(url),
            Err(_) => Ok(format!("http://127.0.0.1:{}", service_port_from_env()?)),
        }
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Demo feature: {}", self.feature);
        tracing::info!("  State file: {}",
            self.state_file.as_deref().unwrap_or("none (starting empty)"));
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}
