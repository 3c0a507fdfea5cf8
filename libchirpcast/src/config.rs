//! Configuration management for Chirpcast
//!
//! Configuration comes from a TOML file (see [`resolve_config_path`]) and is
//! then resolved into [`Settings`] with environment variables taking
//! precedence. The environment keys are the ones agent runtimes already use
//! (`TWITTER_USERNAME`, `MAX_TWEET_LENGTH`, ...), so an existing deployment
//! can run without a config file at all.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const ENV_CONFIG_PATH: &str = "CHIRPCAST_CONFIG";
pub const ENV_USERNAME: &str = "TWITTER_USERNAME";
pub const ENV_PASSWORD: &str = "TWITTER_PASSWORD";
pub const ENV_EMAIL: &str = "TWITTER_EMAIL";
pub const ENV_TWO_FACTOR_SECRET: &str = "TWITTER_2FA_SECRET";
pub const ENV_MAX_POST_LENGTH: &str = "MAX_TWEET_LENGTH";
pub const ENV_DRY_RUN: &str = "TWITTER_DRY_RUN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub twitter: TwitterConfig,
    pub posting: PostingConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Provider name reported alongside successful posts
    pub provider: String,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key, used only when `api_key_env` is unset
    pub api_key: Option<String>,
    pub small_model: String,
    pub medium_model: String,
    pub large_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            small_model: "gpt-4o-mini".to_string(),
            medium_model: "gpt-4o".to_string(),
            large_model: "gpt-4o".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub two_factor_secret: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Maximum length of a generated post, in characters
    pub max_post_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file at the XDG default location yields the default
    /// configuration; a missing file named by `CHIRPCAST_CONFIG` is an error.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).is_ok();
        let config_path = resolve_config_path()?;
        if !explicit && !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

impl GenerationConfig {
    /// Resolve the provider API key from the configured environment variable,
    /// falling back to the inline key
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        lookup(&self.api_key_env)
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.is_empty()))
            .map(SecretString::from)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("chirpcast").join("config.toml"))
}

/// Platform login credentials
///
/// Secrets stay wrapped until the login request body is built.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub email: Option<String>,
    pub two_factor_secret: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(SecretString::from(password.to_string())),
            email: None,
            two_factor_secret: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_two_factor_secret(mut self, secret: &str) -> Self {
        self.two_factor_secret = Some(SecretString::from(secret.to_string()));
        self
    }

    /// Username and password are set and non-empty, the minimum for a login
    pub fn has_login(&self) -> bool {
        let username = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let password = self
            .password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty());
        username && password
    }

    /// Username, password and email are all set and non-empty
    pub fn is_complete(&self) -> bool {
        self.has_login() && self.email.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Settings consumed by the compose-and-publish pipeline
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub credentials: Credentials,
    pub max_post_length: Option<usize>,
    pub dry_run: bool,
}

impl Settings {
    /// Resolve settings from the config file values and the process environment
    pub fn resolve(config: &Config) -> Result<Self> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve settings using `lookup` for environment values
    ///
    /// Environment values win over file values. Empty strings count as unset.
    pub fn resolve_with(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let setting = |key: &str, fallback: &Option<String>| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .or_else(|| fallback.clone().filter(|value| !value.is_empty()))
        };

        let twitter = &config.twitter;
        let credentials = Credentials {
            username: setting(ENV_USERNAME, &twitter.username),
            password: setting(ENV_PASSWORD, &twitter.password).map(SecretString::from),
            email: setting(ENV_EMAIL, &twitter.email),
            two_factor_secret: setting(ENV_TWO_FACTOR_SECRET, &twitter.two_factor_secret)
                .map(SecretString::from),
        };

        let max_post_length = match lookup(ENV_MAX_POST_LENGTH).filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue {
                    key: ENV_MAX_POST_LENGTH.to_string(),
                    value: raw.clone(),
                }
            })?),
            None => config.posting.max_post_length,
        };

        let dry_run = match lookup(ENV_DRY_RUN) {
            Some(raw) => raw.trim().eq_ignore_ascii_case("true"),
            None => twitter.dry_run,
        };

        Ok(Self {
            credentials,
            max_post_length,
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generation]
provider = "ollama"
base_url = "http://localhost:11434/v1"
small_model = "llama3.2:1b"

[twitter]
username = "agent"
password = "hunter2"
email = "agent@example.com"
dry_run = true

[posting]
max_post_length = 200

[http]
request_timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.generation.provider, "ollama");
        assert_eq!(config.generation.small_model, "llama3.2:1b");
        assert_eq!(config.generation.large_model, "gpt-4o");
        assert_eq!(config.twitter.username.as_deref(), Some("agent"));
        assert!(config.twitter.dry_run);
        assert_eq!(config.posting.max_post_length, Some(200));
        assert_eq!(config.http.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.generation.provider, "openai");
        assert!(config.twitter.username.is_none());
        assert!(config.posting.max_post_length.is_none());
    }

    #[test]
    fn test_load_from_path_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[twitter\nusername = ").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let mut config = Config::default();
        config.twitter.username = Some("file-user".to_string());
        config.twitter.password = Some("file-pass".to_string());
        config.posting.max_post_length = Some(100);

        let settings = Settings::resolve_with(
            &config,
            env(&[
                ("TWITTER_USERNAME", "env-user"),
                ("TWITTER_EMAIL", "env@example.com"),
                ("MAX_TWEET_LENGTH", "150"),
            ]),
        )
        .unwrap();

        let creds = &settings.credentials;
        assert_eq!(creds.username.as_deref(), Some("env-user"));
        assert_eq!(creds.password.as_ref().unwrap().expose_secret(), "file-pass");
        assert_eq!(creds.email.as_deref(), Some("env@example.com"));
        assert!(creds.two_factor_secret.is_none());
        assert_eq!(settings.max_post_length, Some(150));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let settings = Settings::resolve_with(
            &Config::default(),
            env(&[("TWITTER_USERNAME", ""), ("TWITTER_PASSWORD", "pw")]),
        )
        .unwrap();
        assert!(settings.credentials.username.is_none());
        assert!(!settings.credentials.is_complete());
    }

    #[test]
    fn test_empty_credentials_are_incomplete() {
        let empty = Credentials::new("", "").with_email("");
        assert!(!empty.has_login());
        assert!(!empty.is_complete());

        assert!(!Credentials::new("agent", "").with_email("a@example.com").is_complete());
        assert!(!Credentials::new("agent", "pw").with_email("").is_complete());

        let login_only = Credentials::new("agent", "pw");
        assert!(login_only.has_login());
        assert!(!login_only.is_complete());
        assert!(login_only.with_email("a@example.com").is_complete());
    }

    #[test]
    fn test_invalid_max_length_is_rejected() {
        let err = Settings::resolve_with(&Config::default(), env(&[("MAX_TWEET_LENGTH", "long")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_TWEET_LENGTH"));
    }

    #[test]
    fn test_dry_run_flag_is_case_insensitive() {
        for raw in ["true", "TRUE", "True"] {
            let settings =
                Settings::resolve_with(&Config::default(), env(&[("TWITTER_DRY_RUN", raw)]))
                    .unwrap();
            assert!(settings.dry_run, "{} should enable dry run", raw);
        }

        let mut config = Config::default();
        config.twitter.dry_run = true;
        let settings = Settings::resolve_with(&config, env(&[("TWITTER_DRY_RUN", "yes")])).unwrap();
        assert!(!settings.dry_run);
    }

    #[test]
    fn test_api_key_resolution() {
        let mut generation = GenerationConfig::default();
        assert!(generation.resolve_api_key(env(&[])).is_none());

        generation.api_key = Some("inline".to_string());
        let key = generation.resolve_api_key(env(&[])).unwrap();
        assert_eq!(key.expose_secret(), "inline");

        let key = generation
            .resolve_api_key(env(&[("OPENAI_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(key.expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn test_load_uses_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirp.toml");
        std::fs::write(&path, "[posting]\nmax_post_length = 42\n").unwrap();

        std::env::set_var(ENV_CONFIG_PATH, &path);
        let loaded = Config::load();
        std::env::remove_var(ENV_CONFIG_PATH);

        assert_eq!(loaded.unwrap().posting.max_post_length, Some(42));
    }

    #[test]
    #[serial]
    fn test_load_fails_for_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(ENV_CONFIG_PATH, dir.path().join("missing.toml"));
        let loaded = Config::load();
        std::env::remove_var(ENV_CONFIG_PATH);

        assert!(loaded.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("agent", "hunter2").with_two_factor_secret("JBSWY3DPEHPK3PXP");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
    }
}
