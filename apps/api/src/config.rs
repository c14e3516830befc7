use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FONT_PATH: &str = "fonts/Cairo-VariableFont_slnt,wght.ttf";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_LOGO_DIR: &str = "logos";
const DEFAULT_IMAGE_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Application configuration loaded from environment variables.
/// Every value has a default; the messaging relay is enabled only when its
/// credentials are present.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub font_path: PathBuf,
    pub upload_dir: PathBuf,
    pub logo_dir: PathBuf,
    pub image_fetch_timeout: Duration,
    pub whatsapp: Option<WhatsAppSettings>,
}

/// WhatsApp Cloud API credentials.
#[derive(Clone)]
pub struct WhatsAppSettings {
    pub token: String,
    pub phone_number_id: String,
    pub api_base: String,
}

impl fmt::Debug for WhatsAppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppSettings")
            .field("token", &"<redacted>")
            .field("phone_number_id", &self.phone_number_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            rust_log: "info".to_string(),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            logo_dir: PathBuf::from(DEFAULT_LOGO_DIR),
            image_fetch_timeout: Duration::from_secs(DEFAULT_IMAGE_FETCH_TIMEOUT_SECS),
            whatsapp: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let port = match get("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => defaults.port,
        };

        let image_fetch_timeout = match get("IMAGE_FETCH_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .context("IMAGE_FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.image_fetch_timeout,
        };

        let whatsapp = match (get("WHATSAPP_TOKEN"), get("WHATSAPP_PHONE_NUMBER_ID")) {
            (Some(token), Some(phone_number_id)) => Some(WhatsAppSettings {
                token,
                phone_number_id,
                api_base: get("WHATSAPP_API_BASE")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            _ => None,
        };

        Ok(Config {
            port,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            font_path: get("FONT_PATH").map(PathBuf::from).unwrap_or(defaults.font_path),
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            logo_dir: get("LOGO_DIR").map(PathBuf::from).unwrap_or(defaults.logo_dir),
            image_fetch_timeout,
            whatsapp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.font_path, PathBuf::from(DEFAULT_FONT_PATH));
        assert_eq!(config.image_fetch_timeout, Duration::from_secs(20));
        assert!(config.whatsapp.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("UPLOAD_DIR", "/tmp/up"),
            ("IMAGE_FETCH_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/up"));
        assert_eq!(config.image_fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_port_is_error() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }

    #[test]
    fn test_invalid_timeout_is_error() {
        assert!(config_from(&[("IMAGE_FETCH_TIMEOUT_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_relay_needs_both_credentials() {
        assert!(config_from(&[("WHATSAPP_TOKEN", "t")]).unwrap().whatsapp.is_none());

        let config = config_from(&[
            ("WHATSAPP_TOKEN", "t"),
            ("WHATSAPP_PHONE_NUMBER_ID", "123"),
            ("WHATSAPP_API_BASE", "http://localhost:9000/"),
        ])
        .unwrap();
        let relay = config.whatsapp.unwrap();
        assert_eq!(relay.phone_number_id, "123");
        assert_eq!(relay.api_base, "http://localhost:9000");
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = WhatsAppSettings {
            token: "secret-token".into(),
            phone_number_id: "1".into(),
            api_base: DEFAULT_WHATSAPP_API_BASE.into(),
        };
        assert!(!format!("{settings:?}").contains("secret-token"));
    }
}
