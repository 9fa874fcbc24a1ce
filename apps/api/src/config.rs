use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Application configuration loaded from environment variables.
/// The API key is optional: a missing key is logged at startup and the
/// completion endpoint is left to reject the request.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_api_key = lookup("DEEPSEEK_API_KEY").filter(|k| !k.trim().is_empty());

        let max_upload_mb: usize = parse_or(&lookup, "MAX_UPLOAD_MB", 20)?;

        Ok(Config {
            llm_api_key,
            llm_api_url: lookup("DEEPSEEK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", 120)?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.llm_api_key.is_none());
        assert_eq!(config.llm_api_url, DEFAULT_API_URL);
        assert_eq!(config.llm_timeout_secs, 120);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("DEEPSEEK_API_URL", "http://127.0.0.1:9000/v1/chat/completions"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("MAX_UPLOAD_MB", "5"),
            ("PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm_api_url, "http://127.0.0.1:9000/v1/chat/completions");
        assert_eq!(config.llm_timeout_secs, 30);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("DEEPSEEK_API_KEY", "   ")])).unwrap();
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
