//! Configuration settings for Koble.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub platform: PlatformSettings,
    pub user: UserSettings,
    pub connection: ConnectionSettings,
    pub agent: AgentSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.koble".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Integration platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Base URL of the integration platform API.
    pub base_url: String,
    /// Request timeout for platform API calls (seconds).
    pub timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: "https://backend.composio.dev".to_string(),
            timeout_secs: 30,
        }
    }
}

/// End-user identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct UserSettings {
    /// External user id known to the integration platform.
    /// Overridden by the EXTERNAL_USER_ID environment variable.
    pub id: Option<String>,
}


/// Strategy for picking among multiple connected accounts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AccountSelection {
    /// Take the first account the platform returns.
    #[default]
    First,
    /// Take the most recently created account.
    Newest,
}

impl std::str::FromStr for AccountSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(AccountSelection::First),
            "newest" | "latest" => Ok(AccountSelection::Newest),
            _ => Err(format!("Unknown account selection: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountSelection::First => write!(f, "first"),
            AccountSelection::Newest => write!(f, "newest"),
        }
    }
}

/// Connection resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Auth config id used when a new authorization handshake is needed.
    /// Overridden by the AUTH_CONFIG_ID environment variable.
    pub auth_config_id: Option<String>,
    /// Which account to use when multiple connections exist.
    pub selection: AccountSelection,
    /// How long to wait for the user to complete authorization (seconds).
    pub wait_timeout_secs: u64,
    /// How often to poll for handshake completion (seconds).
    pub poll_interval_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            auth_config_id: None,
            selection: AccountSelection::First,
            wait_timeout_secs: 180,
            poll_interval_secs: 2,
        }
    }
}

/// Agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Display name for the agent.
    pub name: String,
    /// System prompt describing allowed behavior.
    pub instructions: String,
    /// LLM model to use.
    pub model: String,
    /// Maximum iterations of the tool-calling loop.
    pub max_iterations: usize,
    /// Remote tool slugs fetched for agent runs.
    pub tools: Vec<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "Email Manager".to_string(),
            instructions: "You are a helpful assistant that can manage emails on behalf of the user."
                .to_string(),
            model: "gpt-4o".to_string(),
            max_iterations: 8,
            tools: vec!["GMAIL_CREATE_EMAIL_DRAFT".to_string()],
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KobleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("koble")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Resolve the external user id: environment variable wins over config.
    pub fn user_id(&self) -> crate::error::Result<String> {
        resolve_value(
            "EXTERNAL_USER_ID",
            self.user.id.as_deref(),
            "No user id configured. Set EXTERNAL_USER_ID or [user] id in the config file.",
        )
    }

    /// Resolve the auth config id: environment variable wins over config.
    pub fn auth_config_id(&self) -> crate::error::Result<String> {
        resolve_value(
            "AUTH_CONFIG_ID",
            self.connection.auth_config_id.as_deref(),
            "No auth config id configured. Set AUTH_CONFIG_ID or [connection] auth_config_id in the config file.",
        )
    }
}

/// Pick the env var when set and non-empty, else the config value.
fn resolve_value(
    env_var: &str,
    config_value: Option<&str>,
    missing_hint: &str,
) -> crate::error::Result<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(value);
        }
    }
    match config_value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(crate::error::KobleError::Config(missing_hint.to_string())),
    }
}
