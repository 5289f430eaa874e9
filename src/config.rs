//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4000;
/// Default model used for answer normalization.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default OpenAI-compatible API base URL.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Question-flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Upper bound on a single normalization call. Expiry counts as failure.
    pub normalize_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            normalize_timeout: Duration::from_secs(10),
        }
    }
}

/// Server configuration, read from `RESUME_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// OpenAI API key. When absent, answers are stored without rewriting.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub llm_base_url: String,
    /// Directory for daily rolling log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
    pub flow: FlowConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db_path: PathBuf::from("./data/resume.db"),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            log_dir: None,
            flow: FlowConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("RESUME_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "RESUME_PORT".to_string(),
                message: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let normalize_timeout = match get("RESUME_NORMALIZE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "RESUME_NORMALIZE_TIMEOUT_SECS".to_string(),
                    message: format!("{e}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "RESUME_NORMALIZE_TIMEOUT_SECS".to_string(),
                        message: "must be at least 1 second".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.flow.normalize_timeout,
        };

        Ok(Self {
            port,
            db_path: get("RESUME_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            api_key: get("OPENAI_API_KEY").map(SecretString::from),
            model: get("RESUME_MODEL").unwrap_or(defaults.model),
            llm_base_url: get("RESUME_LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            log_dir: get("RESUME_LOG_DIR").map(PathBuf::from),
            flow: FlowConfig { normalize_timeout },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.db_path, PathBuf::from("./data/resume.db"));
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.flow.normalize_timeout, Duration::from_secs(10));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("RESUME_PORT", "8081"),
            ("RESUME_DB_PATH", "/tmp/r.db"),
            ("OPENAI_API_KEY", "sk-test"),
            ("RESUME_MODEL", "gpt-4o-mini"),
            ("RESUME_NORMALIZE_TIMEOUT_SECS", "3"),
            ("RESUME_LOG_DIR", "/var/log/resume"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.db_path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.flow.normalize_timeout, Duration::from_secs(3));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/resume")));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("RESUME_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("RESUME_PORT"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("RESUME_NORMALIZE_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "RESUME_NORMALIZE_TIMEOUT_SECS"
        ));

        let config =
            ServerConfig::from_lookup(lookup(&[("RESUME_NORMALIZE_TIMEOUT_SECS", "1")])).unwrap();
        assert_eq!(config.flow.normalize_timeout, Duration::from_secs(1));
    }
}
