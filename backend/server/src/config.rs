use std::{
    collections::HashSet, env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration,
};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: &str = "5000";
pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_STORE_TIMEOUT_MS: &str = "3000";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5174,https://our-space-vi1q.vercel.app";

const SECRET_KEYS_VAR: &str = "SECRET_KEYS";
const NUMBERED_SECRET_PREFIX: &str = "SECRET_KEY_";
const MAX_NUMBERED_SECRETS: usize = 16;
const SECRETS_DIR: &str = "/run/secrets";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("No secret keys configured (set SECRET_KEYS or SECRET_KEY_1)")]
    NoSecretKeys,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub store_timeout: Duration,
    pub secret_keys: Vec<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, `Config::load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms: u64 = try_load(&lookup, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;

        Ok(Self {
            port: try_load(&lookup, "PORT", DEFAULT_PORT)?,
            store_url: try_load(&lookup, "STORE_URL", DEFAULT_STORE_URL)?,
            store_timeout: Duration::from_millis(timeout_ms),
            secret_keys: load_secret_keys(&lookup)?,
            allowed_origins: split_list(&try_load::<String, _>(
                &lookup,
                "ALLOWED_ORIGINS",
                DEFAULT_ALLOWED_ORIGINS,
            )?),
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

fn load_secret_keys<F>(lookup: &F) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys = lookup(SECRET_KEYS_VAR)
        .map(|list| split_list(&list))
        .unwrap_or_default();

    // gaps are allowed, `SECRET_KEY_2` alone is a valid setup
    for index in 1..=MAX_NUMBERED_SECRETS {
        let Some(key) = lookup(&format!("{NUMBERED_SECRET_PREFIX}{index}")) else {
            continue;
        };
        let key = key.trim().to_string();
        if !key.is_empty() {
            keys.push(key);
        }
    }

    if keys.is_empty() {
        if let Some(list) = read_secret(SECRET_KEYS_VAR) {
            keys = split_list(&list);
        }
    }

    let mut seen = HashSet::new();
    keys.retain(|key| seen.insert(key.clone()));

    if keys.is_empty() {
        return Err(ConfigError::NoSecretKeys);
    }

    info!("Loaded {} secret key(s)", keys.len());
    Ok(keys)
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("{SECRETS_DIR}/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("SECRET_KEY_1", "alpha")])).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.store_url, DEFAULT_STORE_URL);
        assert_eq!(config.store_timeout, Duration::from_secs(3));
        assert_eq!(config.secret_keys, vec!["alpha"]);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5174", "https://our-space-vi1q.vercel.app"]
        );
    }

    #[test]
    fn test_numbered_and_listed_keys() {
        let config = Config::from_lookup(lookup(&[
            ("SECRET_KEYS", "one, two"),
            ("SECRET_KEY_1", "three"),
            ("SECRET_KEY_2", "four"),
            ("SECRET_KEY_3", "one"),
        ]))
        .unwrap();

        assert_eq!(config.secret_keys, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_numbered_keys_with_gaps() {
        let config = Config::from_lookup(lookup(&[("SECRET_KEY_2", "beta")])).unwrap();
        assert_eq!(config.secret_keys, vec!["beta"]);

        let config = Config::from_lookup(lookup(&[
            ("SECRET_KEY_1", "alpha"),
            ("SECRET_KEY_3", " gamma "),
            ("SECRET_KEY_16", "last"),
            ("SECRET_KEY_17", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.secret_keys, vec!["alpha", "gamma", "last"]);
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup(&[("PORT", "http"), ("SECRET_KEY_1", "alpha")]));

        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("STORE_URL", "memory://"),
            ("STORE_TIMEOUT_MS", "250"),
            ("ALLOWED_ORIGINS", "https://a.example,,https://b.example "),
            ("SECRET_KEYS", "k"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store_url, "memory://");
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }
}
