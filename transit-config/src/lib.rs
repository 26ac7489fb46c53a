//! # Transit Config
//!
//! Configuration for the transit authorization core: where guards redirect,
//! which roles act as wildcards, how delimited claims are split, which keys
//! the session persists, and the messages shown to users.
//!
//! A configuration can be built in code, loaded from JSON or TOML files, or
//! read from environment variables. One validated configuration can be
//! installed as the process-wide default.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use transit_token::ClaimKind;

/// Errors that can occur when working with transit-auth configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: '{value}'. Redirect paths must start with '/'.")]
    InvalidPath { field: &'static str, value: String },

    #[error("Wildcard roles must not contain empty entries.")]
    InvalidWildcard,

    #[error("Claim delimiters must not be empty.")]
    MissingDelimiters,

    #[error("Session storage keys must not be empty.")]
    MissingTokenKey,

    #[error("Invalid check kind: '{0}'. Expected 'role' or 'permission'.")]
    InvalidCheckKind(String),

    #[error("I/O error occurred while reading configuration: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Failed to parse configuration data: {0}")]
    ParseError(String),

    #[error("Global configuration has already been initialized.")]
    AlreadyInitialized,

    #[error("Environment variable error: {0}")]
    EnvVarError(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

/// Configuration for guards, resolver and session persistence
///
/// Every field has a default, so a partial file or an empty environment
/// yields a usable configuration.
///
/// # Examples
///
/// ```
/// use transit_config::AuthConfig;
///
/// let config = AuthConfig::builder()
///     .login_path("/signin")
///     .forbidden_path("/denied")
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.login_path, "/signin");
/// assert_eq!(config.wildcard_roles, vec!["admin", "*"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Where unauthenticated users are sent
    pub login_path: String,
    /// Default fallback for permission denials
    pub forbidden_path: String,
    /// Extra role values that pass every check, compared case-insensitively.
    /// `admin` and `*` always do, whatever is listed here.
    pub wildcard_roles: Vec<String>,
    /// Characters separating entries in a delimited role/permission string
    pub claim_delimiters: Vec<char>,
    /// Claim consulted by permission guards
    pub guard_check_kind: ClaimKind,
    /// Key the raw token is persisted under
    pub token_key: String,
    /// Key the signed-in user's profile is persisted under
    pub identity_key: String,
    /// Additional persisted keys removed when the session is cleared
    pub persisted_keys: Vec<String>,
    /// File backing persisted session keys; see [`AuthConfig::session_file_path`]
    pub session_file: Option<PathBuf>,
    pub expired_message: String,
    pub invalid_message: String,
    pub denied_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            forbidden_path: "/403".to_string(),
            wildcard_roles: vec!["admin".to_string(), "*".to_string()],
            claim_delimiters: vec![','],
            guard_check_kind: ClaimKind::Permission,
            token_key: "token".to_string(),
            identity_key: "user".to_string(),
            persisted_keys: Vec::new(),
            session_file: None,
            expired_message: "Your session has expired. Please sign in again.".to_string(),
            invalid_message: "Your session is no longer valid. Please sign in again.".to_string(),
            denied_message: "You do not have permission to access this page.".to_string(),
        }
    }
}

/// Builder for AuthConfig
///
/// Unset fields keep their defaults.
#[derive(Default, Debug)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Create a new AuthConfigBuilder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new AuthConfigBuilder from an existing AuthConfig
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the login redirect path
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    /// Set the default forbidden redirect path
    pub fn forbidden_path(mut self, path: impl Into<String>) -> Self {
        self.config.forbidden_path = path.into();
        self
    }

    /// Replace the wildcard roles
    pub fn wildcard_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.wildcard_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the delimiter characters for delimited claims
    pub fn claim_delimiters(mut self, delimiters: impl IntoIterator<Item = char>) -> Self {
        self.config.claim_delimiters = delimiters.into_iter().collect();
        self
    }

    /// Set the claim consulted by permission guards
    pub fn guard_check_kind(mut self, kind: ClaimKind) -> Self {
        self.config.guard_check_kind = kind;
        self
    }

    pub fn token_key(mut self, key: impl Into<String>) -> Self {
        self.config.token_key = key.into();
        self
    }

    pub fn identity_key(mut self, key: impl Into<String>) -> Self {
        self.config.identity_key = key.into();
        self
    }

    /// Add a key removed alongside the token on logout
    pub fn persisted_key(mut self, key: impl Into<String>) -> Self {
        self.config.persisted_keys.push(key.into());
        self
    }

    pub fn session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.session_file = Some(path.into());
        self
    }

    pub fn expired_message(mut self, message: impl Into<String>) -> Self {
        self.config.expired_message = message.into();
        self
    }

    pub fn invalid_message(mut self, message: impl Into<String>) -> Self {
        self.config.invalid_message = message.into();
        self
    }

    pub fn denied_message(mut self, message: impl Into<String>) -> Self {
        self.config.denied_message = message.into();
        self
    }

    /// Build the AuthConfig
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails [`AuthConfig::validate`]
    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl AuthConfig {
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::new()
    }

    /// Convert this configuration to a builder for modification
    pub fn to_builder(&self) -> AuthConfigBuilder {
        AuthConfigBuilder::from_config(self)
    }

    /// Create a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: AuthConfig = serde_json::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: AuthConfig = toml::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from environment variables
    ///
    /// The environment variables are named with the given prefix followed by:
    /// - LOGIN_PATH
    /// - FORBIDDEN_PATH
    /// - WILDCARD_ROLES: comma-separated
    /// - CLAIM_DELIMITERS: every character is a delimiter
    /// - CHECK_KIND: `role` or `permission`
    /// - TOKEN_KEY, IDENTITY_KEY
    /// - PERSISTED_KEYS: comma-separated
    /// - SESSION_FILE
    /// - EXPIRED_MESSAGE, INVALID_MESSAGE, DENIED_MESSAGE
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no variable with the prefix is set, or if a value
    /// is invalid.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = AuthConfig::default();
        let mut any_set = false;
        let mut var = |name: &str| -> Result<Option<String>, ConfigError> {
            let value = optional_var(&format!("{prefix}_{name}"))?;
            any_set |= value.is_some();
            Ok(value)
        };

        if let Some(v) = var("LOGIN_PATH")? {
            config.login_path = v;
        }
        if let Some(v) = var("FORBIDDEN_PATH")? {
            config.forbidden_path = v;
        }
        if let Some(v) = var("WILDCARD_ROLES")? {
            config.wildcard_roles = split_list(&v);
        }
        if let Some(v) = var("CLAIM_DELIMITERS")? {
            config.claim_delimiters = v.chars().collect();
        }
        if let Some(v) = var("CHECK_KIND")? {
            config.guard_check_kind =
                ClaimKind::parse(&v).ok_or(ConfigError::InvalidCheckKind(v))?;
        }
        if let Some(v) = var("TOKEN_KEY")? {
            config.token_key = v;
        }
        if let Some(v) = var("IDENTITY_KEY")? {
            config.identity_key = v;
        }
        if let Some(v) = var("PERSISTED_KEYS")? {
            config.persisted_keys = split_list(&v);
        }
        if let Some(v) = var("SESSION_FILE")? {
            config.session_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("EXPIRED_MESSAGE")? {
            config.expired_message = v;
        }
        if let Some(v) = var("INVALID_MESSAGE")? {
            config.invalid_message = v;
        }
        if let Some(v) = var("DENIED_MESSAGE")? {
            config.denied_message = v;
        }

        if !any_set {
            return Err(ConfigError::EnvVarError(format!(
                "no {prefix}_* variables are set"
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("login path", &self.login_path),
            ("forbidden path", &self.forbidden_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.wildcard_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::InvalidWildcard);
        }

        if self.claim_delimiters.is_empty() {
            return Err(ConfigError::MissingDelimiters);
        }

        if self.token_key.trim().is_empty() || self.identity_key.trim().is_empty() {
            return Err(ConfigError::MissingTokenKey);
        }

        Ok(())
    }

    /// The token and identity keys followed by every other persisted key,
    /// without duplicates
    pub fn all_persisted_keys(&self) -> Vec<String> {
        let mut keys = vec![self.token_key.clone()];
        if self.identity_key != self.token_key {
            keys.push(self.identity_key.clone());
        }
        for key in &self.persisted_keys {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// The configured session file, or `<data dir>/transit-auth/session.json`
    pub fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("transit-auth").join("session.json")))
    }
}

fn optional_var(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVarError(format!("{name}: {e}"))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Global configuration singleton
static DEFAULT_CONFIG: OnceLock<AuthConfig> = OnceLock::new();

/// Set the default global configuration
///
/// Returns an error if a default configuration is already set.
pub fn set_default_config(config: AuthConfig) -> Result<(), ConfigError> {
    config.validate()?;
    DEFAULT_CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Get the default global configuration, if set
pub fn get_default_config() -> Option<&'static AuthConfig> {
    DEFAULT_CONFIG.get()
}

/// Try to load a configuration from standard locations
///
/// This function attempts, in order:
/// 1. Environment variables with the prefix "TRANSIT_AUTH"
/// 2. `./transit-auth.json`, `~/.transit-auth/config.json`
/// 3. With the "toml" feature, the same locations with a `.toml` extension
///
/// Returns None if no configuration could be found.
pub fn try_load_default_config() -> Option<AuthConfig> {
    if let Ok(config) = AuthConfig::from_env("TRANSIT_AUTH") {
        return Some(config);
    }

    for path in candidate_paths("json") {
        if path.exists() {
            if let Ok(config) = AuthConfig::from_file(&path) {
                return Some(config);
            }
        }
    }

    #[cfg(feature = "toml")]
    for path in candidate_paths("toml") {
        if path.exists() {
            if let Ok(config) = AuthConfig::from_toml(&path) {
                return Some(config);
            }
        }
    }

    None
}

fn candidate_paths(extension: &str) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(format!("./transit-auth.{extension}"))];
    if let Some(home) = dirs::home_dir() {
        paths.push(
            home.join(".transit-auth")
                .join(format!("config.{extension}")),
        );
    }
    paths
}
