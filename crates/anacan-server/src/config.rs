//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the dev server starts with zero
//! configuration. Remote connection settings are read separately through
//! [`anacan_provision::RemoteConfig`].

use std::net::SocketAddr;

use anacan_shared::constants::DEFAULT_SITE_URL;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `127.0.0.1:8080`
    pub http_addr: SocketAddr,

    /// Public site origin used to build sitemap URLs, without trailing slash.
    /// Env: `SITE_URL`
    /// Default: `https://anacan.az`
    pub site_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([127, 0, 0, 1], 8080).into(),
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(url) = lookup("SITE_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.site_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid SITE_URL, using default");
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 8080).into());
        assert_eq!(config.site_url, "https://anacan.az");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "HTTP_ADDR" => Some("0.0.0.0:3000".into()),
            "SITE_URL" => Some("https://staging.anacan.az/".into()),
            _ => None,
        });
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert_eq!(config.site_url, "https://staging.anacan.az");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(|key| match key {
            "HTTP_ADDR" => Some("localhost".into()),
            "SITE_URL" => Some("anacan.az".into()),
            _ => None,
        });
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.site_url, DEFAULT_SITE_URL);
    }
}
