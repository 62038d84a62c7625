use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} is invalid")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub control_plane_api_key: String,
    pub action_window: Duration,
    pub rate_limit_sweep_threshold: usize,
    pub list_max_limit: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: parse_or("LISTEN_ADDR", "0.0.0.0:8080")?,
            control_plane_api_key: env::var("CONTROL_PLANE_API_KEY")
                .map_err(|_| ConfigError::Missing("CONTROL_PLANE_API_KEY"))?,
            action_window: Duration::from_secs(parse_or("ACTION_WINDOW_SECS", "60")?),
            rate_limit_sweep_threshold: parse_or("RATE_LIMIT_SWEEP_THRESHOLD", "1024")?,
            list_max_limit: parse_or("LIST_MAX_LIMIT", "100")?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .map_err(|_| ConfigError::Invalid(name))
}
