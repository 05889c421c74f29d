use std::env;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use vic_api::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, thiserror::Error)]
#[error("{var} is invalid: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Host client this process is nested in.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub url: String,
    pub root_path: String,
    pub client_type: String,
    pub client_version: String,
    pub session_user: Option<String>,
    pub session_locale: String,
    pub session_client_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub host: Option<HostConfig>,
    pub service_url: String,
    pub prefs_path: PathBuf,
    pub refresh_interval_secs: u64,
    pub page_size: NonZeroU32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = lookup("VIC_HOST_URL").map(|url| HostConfig {
            url,
            root_path: or("VIC_HOST_ROOT_PATH", "/ui"),
            client_type: or("VIC_HOST_CLIENT_TYPE", "html"),
            client_version: or("VIC_HOST_CLIENT_VERSION", "6.5"),
            session_user: lookup("VIC_SESSION_USER"),
            session_locale: or("VIC_SESSION_LOCALE", "en_US"),
            session_client_id: lookup("VIC_SESSION_CLIENT_ID"),
        });

        Ok(Self {
            listen_addr: parse(&lookup, "VIC_LISTEN_ADDR", "127.0.0.1:8080")?,
            host,
            service_url: or("VIC_SERVICE_URL", "https://localhost:9443"),
            prefs_path: or("VIC_PREFS_PATH", ".vic-prefs.json").into(),
            refresh_interval_secs: parse(&lookup, "VIC_REFRESH_INTERVAL_SECS", "0")?,
            page_size: parse(&lookup, "VIC_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: format!("{raw:?}: {e}"),
    })
}
