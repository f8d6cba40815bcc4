//! Configuration module for the SchoolHub backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory where uploaded banner media is stored
    pub media_dir: PathBuf,
    /// Path to the persisted palette cache
    pub palette_cache_path: PathBuf,
    /// Public base URL used to build media links
    pub public_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Interval between eligibility refreshes of the slideshows
    pub feed_refresh: Duration,
    /// Poster shown while a video banner has not decoded its first frame
    pub poster_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SCHOOLHUB_API_PSK")
            .ok()
            .filter(|psk| !psk.is_empty());

        let db_path = env_or("SCHOOLHUB_DB_PATH", "./data/schoolhub.sqlite").into();
        let media_dir = env_or("SCHOOLHUB_MEDIA_DIR", "./data/media").into();
        let palette_cache_path =
            env_or("SCHOOLHUB_PALETTE_CACHE_PATH", "./data/palette-cache.json").into();

        let public_url = env_or("SCHOOLHUB_PUBLIC_URL", "http://127.0.0.1:8080")
            .trim_end_matches('/')
            .to_string();

        let bind_addr = env_or("SCHOOLHUB_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SCHOOLHUB_BIND_ADDR: {}", e)))?;

        let log_level = env_or("SCHOOLHUB_LOG_LEVEL", "info");

        let max_upload_mb: usize = env_or("SCHOOLHUB_MAX_UPLOAD_MB", "50")
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SCHOOLHUB_MAX_UPLOAD_MB: {}", e)))?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| AppError::Config("SCHOOLHUB_MAX_UPLOAD_MB is too large".to_string()))?;

        let feed_refresh_secs: u64 = env_or("SCHOOLHUB_FEED_REFRESH_SECS", "60")
            .parse()
            .map_err(|e| {
                AppError::Config(format!("Invalid SCHOOLHUB_FEED_REFRESH_SECS: {}", e))
            })?;
        if feed_refresh_secs == 0 {
            return Err(AppError::Config(
                "SCHOOLHUB_FEED_REFRESH_SECS must be greater than zero".to_string(),
            ));
        }

        let poster_url = env_or("SCHOOLHUB_POSTER_URL", "/static/banner-poster.png");

        Ok(Self {
            api_psk,
            db_path,
            media_dir,
            palette_cache_path,
            public_url,
            bind_addr,
            log_level,
            max_upload_bytes,
            feed_refresh: Duration::from_secs(feed_refresh_secs),
            poster_url,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 10] = [
        "SCHOOLHUB_API_PSK",
        "SCHOOLHUB_DB_PATH",
        "SCHOOLHUB_MEDIA_DIR",
        "SCHOOLHUB_PALETTE_CACHE_PATH",
        "SCHOOLHUB_PUBLIC_URL",
        "SCHOOLHUB_BIND_ADDR",
        "SCHOOLHUB_LOG_LEVEL",
        "SCHOOLHUB_MAX_UPLOAD_MB",
        "SCHOOLHUB_FEED_REFRESH_SECS",
        "SCHOOLHUB_POSTER_URL",
    ];

    // Both scenarios share one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/schoolhub.sqlite"));
        assert_eq!(config.media_dir, PathBuf::from("./data/media"));
        assert_eq!(
            config.palette_cache_path,
            PathBuf::from("./data/palette-cache.json")
        );
        assert_eq!(config.public_url, "http://127.0.0.1:8080");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.feed_refresh, Duration::from_secs(60));

        env::set_var("SCHOOLHUB_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        env::remove_var("SCHOOLHUB_BIND_ADDR");

        env::set_var("SCHOOLHUB_MAX_UPLOAD_MB", usize::MAX.to_string());
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        env::remove_var("SCHOOLHUB_MAX_UPLOAD_MB");
    }
}
