//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tutorgate/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/tutorgate/` (~/.config/tutorgate/)
//! - Data: `$XDG_DATA_HOME/tutorgate/` (~/.local/share/tutorgate/)
//! - State/Logs: `$XDG_STATE_HOME/tutorgate/` (~/.local/state/tutorgate/)

use crate::error::{Error, Result};
use crate::frustration::EscalationStrategy;
use crate::types::{BackendKind, Mode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// OpenAI-style chat completions backend (optional)
    #[serde(default)]
    pub openai: Option<ProviderConfig>,

    /// Google Generative AI backend (optional)
    #[serde(default)]
    pub gemini: Option<ProviderConfig>,

    /// Sampling settings shared by every live backend
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Backend priority lists and fallback policy
    #[serde(default)]
    pub routing: RoutingConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-provider connection settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// API key (can also come from the provider env var at load time)
    pub api_key: Option<String>,
    /// Model to use (defaults per provider)
    pub model: Option<String>,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    /// Gemini only: answer with a canned one-liner when the model is not
    /// available for the API version instead of failing
    #[serde(default = "default_true")]
    pub degraded_reply_on_version_mismatch: bool,
}

impl ProviderConfig {
    /// Model name, falling back to the provider default.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

/// Sampling settings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// What the router answers with when every backend failed
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TerminalFallback {
    /// Categorized canned response for the last user message
    #[default]
    Engine,
    /// Fixed mode-appropriate apology
    Static,
}

/// Backend ordering and fallback policy
#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Priority list for Socratic mode
    #[serde(default = "default_socratic_backends")]
    pub socratic: Vec<BackendKind>,

    /// Priority list for direct mode
    #[serde(default = "default_direct_backends")]
    pub direct: Vec<BackendKind>,

    /// How frustration carries across turns
    #[serde(default)]
    pub escalation: EscalationStrategy,

    /// Terminal reply policy
    #[serde(default)]
    pub terminal: TerminalFallback,

    /// Upper bound on a single adapter attempt, in seconds
    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            socratic: default_socratic_backends(),
            direct: default_direct_backends(),
            escalation: EscalationStrategy::default(),
            terminal: TerminalFallback::default(),
            adapter_timeout_secs: default_adapter_timeout(),
        }
    }
}

impl RoutingConfig {
    /// Priority list for `mode`
    pub fn backends_for(&self, mode: Mode) -> &[BackendKind] {
        match mode {
            Mode::Socratic => &self.socratic,
            Mode::Direct => &self.direct,
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.adapter_timeout_secs == 0 {
            return Err(Error::Config(
                "routing.adapter_timeout_secs must be at least 1".to_string(),
            ));
        }
        for mode in [Mode::Socratic, Mode::Direct] {
            let list = self.backends_for(mode);
            for (i, kind) in list.iter().enumerate() {
                if list[..i].contains(kind) {
                    return Err(Error::Config(format!(
                        "routing.{} lists {} more than once",
                        mode,
                        kind.as_str()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn default_socratic_backends() -> Vec<BackendKind> {
    vec![BackendKind::Gemini, BackendKind::OpenAI, BackendKind::Canned]
}

fn default_direct_backends() -> Vec<BackendKind> {
    vec![BackendKind::Gemini, BackendKind::Canned]
}

fn default_adapter_timeout() -> u64 {
    15
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_max_output_tokens() -> u32 {
    800
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Seconds a session may sit idle before it is evicted
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7878".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_keys();
        config.routing.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Fill missing API keys from `OPENAI_API_KEY` / `GOOGLE_API_KEY`.
    ///
    /// A provider section is created when only the env var is present, so a
    /// bare environment is enough to enable a backend. This is the only place
    /// the environment is consulted; adapters receive explicit keys.
    pub fn apply_env_keys(&mut self) {
        fill_key(&mut self.openai, std::env::var("OPENAI_API_KEY").ok());
        fill_key(&mut self.gemini, std::env::var("GOOGLE_API_KEY").ok());
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/tutorgate/config.toml` (~/.config/tutorgate/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("tutorgate").join("config.toml")
    }

    /// Returns the data directory path (for the collection store)
    ///
    /// `$XDG_DATA_HOME/tutorgate/` (~/.local/share/tutorgate/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("tutorgate")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/tutorgate/` (~/.local/state/tutorgate/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("tutorgate")
    }

    /// Returns the collection store path
    ///
    /// `$XDG_DATA_HOME/tutorgate/store.db` (~/.local/share/tutorgate/store.db)
    pub fn store_path() -> PathBuf {
        Self::data_dir().join("store.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

fn fill_key(section: &mut Option<ProviderConfig>, env_key: Option<String>) {
    let Some(key) = env_key.filter(|k| !k.trim().is_empty()) else {
        return;
    };
    let section = section.get_or_insert_with(|| ProviderConfig {
        timeout_secs: default_provider_timeout(),
        degraded_reply_on_version_mismatch: true,
        ..Default::default()
    });
    if section.api_key.is_none() {
        section.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.openai.is_none());
        assert!(config.gemini.is_none());
        assert_eq!(config.generation.max_output_tokens, 800);
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.routing.adapter_timeout_secs, 15);
        assert_eq!(config.server.session_ttl_secs, 3600);
        assert_eq!(
            config.routing.backends_for(Mode::Direct),
            &[BackendKind::Gemini, BackendKind::Canned]
        );
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[openai]
api_key = "sk-test"
model = "gpt-4o-mini"

[gemini]
model = "gemini-1.5-pro"
degraded_reply_on_version_mismatch = false

[generation]
temperature = 0.3

[routing]
socratic = ["openai", "canned"]
direct = ["canned"]
escalation = "one_shot"
terminal = "static"

[server]
session_ttl_secs = 120

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(openai.model_or("gpt-3.5-turbo"), "gpt-4o-mini");
        assert_eq!(openai.timeout_secs, 30);
        assert!(!config.gemini.unwrap().degraded_reply_on_version_mismatch);
        assert_eq!(config.generation.temperature, 0.3);
        assert_eq!(config.generation.max_output_tokens, 800);
        assert_eq!(
            config.routing.socratic,
            vec![BackendKind::OpenAI, BackendKind::Canned]
        );
        assert_eq!(config.routing.escalation, EscalationStrategy::OneShot);
        assert_eq!(config.routing.terminal, TerminalFallback::Static);
        assert_eq!(config.server.bind, "127.0.0.1:7878");
        assert_eq!(config.server.session_ttl_secs, 120);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_routing_validation() {
        assert!(RoutingConfig::default().validate().is_ok());

        let routing = RoutingConfig {
            direct: vec![BackendKind::Canned, BackendKind::Canned],
            ..Default::default()
        };
        assert!(routing.validate().is_err());

        let routing = RoutingConfig {
            adapter_timeout_secs: 0,
            ..Default::default()
        };
        assert!(routing.validate().is_err());
    }

    #[test]
    fn test_fill_key_creates_section() {
        let mut section = None;
        fill_key(&mut section, Some("from-env".to_string()));
        let section = section.unwrap();
        assert_eq!(section.api_key.as_deref(), Some("from-env"));
        assert_eq!(section.timeout_secs, 30);
    }

    #[test]
    fn test_fill_key_keeps_explicit_key() {
        let mut section = Some(ProviderConfig {
            api_key: Some("explicit".to_string()),
            ..Default::default()
        });
        fill_key(&mut section, Some("from-env".to_string()));
        assert_eq!(section.unwrap().api_key.as_deref(), Some("explicit"));

        let mut none = None;
        fill_key(&mut none, Some("  ".to_string()));
        assert!(none.is_none());
    }
}
