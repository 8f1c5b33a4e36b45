//! Configuration file for ~/.config/reader-tui/config.toml.
//!
//! The file is optional. A missing or empty file yields `Config::default()`,
//! and unknown keys are accepted but logged so typos are visible with
//! `RUST_LOG=warn`. The API token can come from the file or from the
//! `READWISE_TOKEN` environment variable, which wins.
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::{DEFAULT_AUTH_URL, DEFAULT_BASE_URL};

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV: &str = "READWISE_TOKEN";
/// Where users obtain an access token.
pub const TOKEN_URL: &str = "https://readwise.io/access_token";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("HOME environment variable not set")]
    NoHome,

    #[error(
        "No Readwise token configured.\n\
         Set READWISE_TOKEN or run: reader config set-token <token>\n\
         Get your token at https://readwise.io/access_token"
    )]
    MissingToken,
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default so any subset of keys can be written.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Readwise access token. [`TOKEN_ENV`] takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Root of the document API.
    pub base_url: String,

    /// Token validation endpoint.
    pub auth_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Column at which the reader wraps text.
    pub wrap_width: u16,

    /// Keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout_secs: 30,
            wrap_width: 80,
            keybindings: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("wrap_width", &self.wrap_width)
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 6] = [
    "token",
    "base_url",
    "auth_url",
    "request_timeout_secs",
    "wrap_width",
    "keybindings",
];

/// `~/.config/reader-tui`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config").join("reader-tui"))
}

/// `~/.config/reader-tui/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warnings
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // removed between metadata and read
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            has_token = config.token.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Write the configuration to `path`.
    ///
    /// Writes to a sibling temp file and renames it over the target so the
    /// file is never observed half-written. On Unix the file is created
    /// `0600` and its directory `0700`, since it can hold the token.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
                    tracing::warn!(path = %dir.display(), error = %e, "Failed to set config directory permissions to 0700");
                }
            }
        }

        let content = toml::to_string_pretty(self)?;

        let suffix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("tmp.{:016x}", suffix));

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let write_result = options.open(&temp_path).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = write_result.and_then(|_| std::fs::rename(&temp_path, path)) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ConfigError::Io(e));
        }

        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// The token to use: `READWISE_TOKEN` if set, else the file.
    pub fn resolve_token(&self) -> Result<SecretString, ConfigError> {
        self.resolve_token_from(std::env::var(TOKEN_ENV).ok())
    }

    /// [`Config::resolve_token`] with the environment value passed in.
    pub fn resolve_token_from(&self, env_token: Option<String>) -> Result<SecretString, ConfigError> {
        let from_env = env_token.filter(|t| !t.trim().is_empty());
        if from_env.is_some() {
            tracing::debug!(var = TOKEN_ENV, "Using token from environment");
        }
        from_env
            .or_else(|| self.token.clone().filter(|t| !t.trim().is_empty()))
            .map(|t| SecretString::from(t.trim().to_string()))
            .ok_or(ConfigError::MissingToken)
    }
}

/// Show just enough of a token to recognise it.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "*".repeat(token.chars().count())
    } else {
        format!("{}{}", visible, "*".repeat(8))
    }
}

// ============================================================================
// Tests
// ============================================================================
