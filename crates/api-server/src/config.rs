//! Process-wide configuration, read once at startup

use std::net::SocketAddr;
use std::path::PathBuf;

use fleet_core::quota::QuotaMode;
use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = ".fleet-data";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_FROM_EMAIL: &str = "noreply@example.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Resend API key; without one, reset links are only logged
    pub resend_api_key: Option<String>,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    /// Public base URL used in password reset links
    pub app_url: String,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    pub quota_mode: QuotaMode,
    /// Seed the demo fleet into an empty store
    pub seed_demo: bool,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let flag = |name: &str, default: bool| match value(name) {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => default,
            },
            None => default,
        };

        let bind_addr = value("FLEET_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                name: "FLEET_BIND_ADDR",
                reason: err.to_string(),
            })?;

        let quota_mode = if flag("FLEET_ENFORCE_QUOTAS", true) {
            QuotaMode::Enforced
        } else {
            QuotaMode::Advisory
        };

        Ok(Self {
            bind_addr,
            data_dir: value("FLEET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            jwt_secret: value("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            app_url: value("APP_URL")
                .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            secure_cookies: flag("FLEET_SECURE_COOKIES", false),
            quota_mode,
            seed_demo: flag("FLEET_SEED_DEMO", false),
            mail: MailConfig {
                resend_api_key: value("RESEND_API_KEY"),
                from_email: value("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
            },
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    #[cfg(test)]
    pub fn for_tests(data_dir: PathBuf) -> Self {
        let mut config = Self::from_lookup(|_| None).unwrap();
        config.data_dir = data_dir;
        config.jwt_secret = "test-secret".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.quota_mode, QuotaMode::Enforced);
        assert!(config.uses_default_secret());
        assert!(!config.secure_cookies);
        assert!(config.mail.resend_api_key.is_none());
        assert_eq!(config.app_url, "http://localhost:3000");
    }

    #[test]
    fn env_values_override_defaults() {
        let config = config_from(&[
            ("FLEET_ENFORCE_QUOTAS", "off"),
            ("JWT_SECRET", "s3cret"),
            ("APP_URL", "https://fleet.example.com/"),
            ("FLEET_SECURE_COOKIES", "yes"),
            ("RESEND_API_KEY", "re_123"),
            ("FLEET_SEED_DEMO", "1"),
        ])
        .unwrap();
        assert_eq!(config.quota_mode, QuotaMode::Advisory);
        assert!(!config.uses_default_secret());
        assert_eq!(config.app_url, "https://fleet.example.com");
        assert!(config.secure_cookies);
        assert!(config.seed_demo);
        assert_eq!(config.mail.resend_api_key.as_deref(), Some("re_123"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(config_from(&[("FLEET_BIND_ADDR", "nowhere")]).is_err());
    }
}
