//! Runtime configuration
//!
//! Loaded from the process environment (after `.env` has been read by the
//! binaries). `from_lookup` keeps the parsing testable without touching
//! process-wide state.

use crate::chain::CategoryStrategy;
use crate::error::ChainError;
use crate::Result;
use std::time::Duration;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
    pub category_strategy: CategoryStrategy,
    /// Clear category and collected data once a request is resolved
    pub reset_on_resolve: bool,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or(ChainError::MissingApiKey)?;

        let api_url = get("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ChainError::Config(format!("GEMINI_TIMEOUT_SECS must be a positive integer, got {:?}", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let category_strategy = match get("CATEGORY_STRATEGY") {
            Some(raw) => raw.parse::<CategoryStrategy>()?,
            None => CategoryStrategy::default(),
        };

        let reset_on_resolve = match get("RESET_ON_RESOLVE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ChainError::Config(format!("RESET_ON_RESOLVE must be true or false, got {:?}", raw))
            })?,
            None => true,
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ChainError::Config(format!("PORT must be a port number, got {:?}", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            category_strategy,
            reset_on_resolve,
            port,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.category_strategy, CategoryStrategy::SuggestThenSelect);
        assert!(config.reset_on_resolve);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_missing_api_key() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ChainError::MissingApiKey));

        let blank = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(blank, ChainError::MissingApiKey));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_API_URL", "http://localhost:9999/generate"),
            ("GEMINI_TIMEOUT_SECS", "3"),
            ("CATEGORY_STRATEGY", "direct"),
            ("RESET_ON_RESOLVE", "false"),
            ("API_PORT", "9090"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:9999/generate");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.category_strategy, CategoryStrategy::Direct);
        assert!(!config.reset_on_resolve);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_invalid_values() {
        let cases = vec![
            ("GEMINI_TIMEOUT_SECS", "0"),
            ("GEMINI_TIMEOUT_SECS", "soon"),
            ("CATEGORY_STRATEGY", "random"),
            ("RESET_ON_RESOLVE", "maybe"),
            ("PORT", "70000"),
        ];

        for (name, value) in cases {
            let result = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k"), (name, value)]));
            assert!(matches!(result, Err(ChainError::Config(_))), "{}={}", name, value);
        }
    }
}
