use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::application::desk_runtime::DeskSettings;
use crate::application::session::DEFAULT_COUNTDOWN_SECS;

pub const DEFAULT_ALERT_SOUND_URL: &str =
    "https://assets.mixkit.co/active_storage/sfx/2869/2869-preview.mp3";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub alert_sound_url: String,
    pub countdown_secs: u32,
    pub poll_interval: Duration,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let alert_sound_url =
            lookup("ALERT_SOUND_URL").unwrap_or_else(|| DEFAULT_ALERT_SOUND_URL.to_string());
        let countdown_secs = positive(&lookup, "NOTIFICATION_SECONDS", DEFAULT_COUNTDOWN_SECS)?;
        let poll_ms = positive(&lookup, "POLL_INTERVAL_MS", 1000u64)?;

        Ok(Config {
            database_url,
            host,
            port,
            alert_sound_url,
            countdown_secs,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }

    pub fn desk_settings(&self) -> DeskSettings {
        DeskSettings {
            countdown_secs: self.countdown_secs,
            tick: Duration::from_secs(1),
            alert_source: self.alert_sound_url.clone(),
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse_or(lookup, name, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/pharmacy")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.countdown_secs, 15);
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.alert_sound_url, DEFAULT_ALERT_SOUND_URL);
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = config(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn zero_countdown_is_rejected() {
        let err = config(&[("DATABASE_URL", "x"), ("NOTIFICATION_SECONDS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "NOTIFICATION_SECONDS",
                ..
            }
        ));
    }

    #[test]
    fn desk_settings_follow_config() {
        let cfg = config(&[
            ("DATABASE_URL", "x"),
            ("NOTIFICATION_SECONDS", "30"),
            ("ALERT_SOUND_URL", "https://example.com/ding.mp3"),
        ])
        .unwrap();
        let settings = cfg.desk_settings();
        assert_eq!(settings.countdown_secs, 30);
        assert_eq!(settings.alert_source, "https://example.com/ding.mp3");
    }
}
