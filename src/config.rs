//! Configuration system for pushkodi.
//!
//! This module handles loading and parsing the JSON configuration file.

use crate::dispatcher::{CommandTable, DismissAction, DispatcherSettings};
use crate::error::{BridgeError, Result};
use crate::message::deserialize_opt_id;
use crate::notifiers::NotifierKind;
use crate::rpc::{HttpJsonRpc, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Connection to Kodi's JSON-RPC interface.
#[derive(Clone, Serialize, Deserialize)]
pub struct KodiConfig {
    /// JSON-RPC endpoint (defaults to `http://localhost:8080/jsonrpc`)
    #[serde(default = "default_endpoint")]
    pub url: String,

    /// Optional HTTP basic-auth user
    #[serde(default)]
    pub username: Option<String>,

    /// Optional HTTP basic-auth password
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for KodiConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint(),
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for KodiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KodiConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl KodiConfig {
    /// Builds the JSON-RPC client for this connection.
    pub fn client(&self) -> HttpJsonRpc {
        let client = HttpJsonRpc::new(self.url.clone());
        match &self.username {
            Some(username) => client.with_credentials(username.clone(), self.password.clone()),
            None => client,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_notification_time() -> u32 {
    6000
}

/// Main configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kodi: KodiConfig,

    /// Where notifications are displayed
    #[serde(default)]
    pub notifier: NotifierKind,

    /// Notification display time in milliseconds
    #[serde(default = "default_notification_time")]
    pub notification_time: u32,

    #[serde(default)]
    pub notification_icon: Option<String>,

    /// Directory for decoded mirror icons (defaults to the system temp dir)
    #[serde(default)]
    pub temp_path: Option<String>,

    /// Id of the playback notification whose dismissal controls the player
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub playback_notification_id: Option<String>,

    #[serde(default)]
    pub dismiss_action: DismissAction,

    /// Inline `kcmd::` commands
    #[serde(default)]
    pub commands: CommandTable,

    /// JSON file with more commands; inline commands win on name clashes
    #[serde(default)]
    pub commands_file: Option<String>,

    #[serde(default)]
    pub commands_notification_icon: Option<String>,

    /// Localized string overrides keyed by string id
    #[serde(default)]
    pub strings: HashMap<String, String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("kodi", &self.kodi)
            .field("notifier", &self.notifier)
            .field("dismiss_action", &self.dismiss_action)
            .field("command_count", &self.commands.len())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from a file path, resolves secrets and merges the command file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or secrets cannot be resolved.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            BridgeError::InvalidConfig(format!("Failed to read config file: {}", e))
        })?;

        let mut config = Self::from_json(&content)?;
        config.resolve_secrets()?;
        config.load_commands_file()?;
        Ok(config)
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(json))
            .map_err(|e| BridgeError::InvalidConfig(format!("Invalid JSON: {}", e)))?;

        Ok(config)
    }

    /// Dispatcher settings with `~` expanded in every path.
    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            notification_time: self.notification_time,
            notification_icon: self.notification_icon.as_deref().map(expand),
            temp_path: self
                .temp_path
                .as_deref()
                .map(|p| PathBuf::from(expand(p)))
                .unwrap_or_else(std::env::temp_dir),
            playback_notification_id: self.playback_notification_id.clone(),
            dismiss_action: self.dismiss_action,
            commands: self.commands.clone(),
            commands_notification_icon: self.commands_notification_icon.as_deref().map(expand),
        }
    }

    /// String overrides with numeric ids; non-numeric keys are skipped.
    pub fn string_overrides(&self) -> HashMap<u32, String> {
        self.strings
            .iter()
            .filter_map(|(id, text)| id.parse().ok().map(|id| (id, text.clone())))
            .collect()
    }

    fn load_commands_file(&mut self) -> Result<()> {
        let Some(path) = &self.commands_file else {
            return Ok(());
        };

        let expanded = expand(path);
        let content = fs::read_to_string(&expanded).map_err(|e| {
            BridgeError::InvalidConfig(format!("Failed to read commands file {}: {}", expanded, e))
        })?;
        let file_commands: CommandTable = serde_json::from_str(&content).map_err(|e| {
            BridgeError::InvalidConfig(format!("Invalid commands file {}: {}", expanded, e))
        })?;

        for (name, command) in file_commands {
            self.commands.entry(name).or_insert(command);
        }
        Ok(())
    }

    /// Resolves secrets in the Kodi connection settings.
    ///
    /// Supports:
    /// - `{{env.VAR_NAME}}` - Environment variables
    /// - `{{file.path/to/file}}` - Read from file
    ///
    /// Note: This is called automatically by `load()`. Only use this directly
    /// when working with configurations created via `from_json()`.
    fn resolve_secrets(&mut self) -> Result<()> {
        self.kodi.url = Self::resolve_secret_string(&self.kodi.url)?;
        for value in [&mut self.kodi.username, &mut self.kodi.password].into_iter().flatten() {
            *value = Self::resolve_secret_string(value)?;
        }
        Ok(())
    }

    fn resolve_secret_string(s: &str) -> Result<String> {
        let mut result = s.to_string();

        // Environment variables: {{env.VAR_NAME}}
        if let Some(start) = result.find("{{env.") {
            if let Some(end) = result[start..].find("}}") {
                let var_name = &result[start + 6..start + end];
                let value = std::env::var(var_name).map_err(|_| {
                    BridgeError::InvalidConfig(format!(
                        "Environment variable not found: {}",
                        var_name
                    ))
                })?;
                result = result.replace(&format!("{{{{env.{}}}}}", var_name), &value);
            }
        }

        // File: {{file.path/to/file}}
        if let Some(start) = result.find("{{file.") {
            if let Some(end) = result[start..].find("}}") {
                let file_path = &result[start + 7..start + end];
                let expanded_path = shellexpand::tilde(file_path);
                let value = fs::read_to_string(expanded_path.as_ref())
                    .map_err(|e| {
                        BridgeError::InvalidConfig(format!(
                            "Failed to read file {}: {}",
                            file_path, e
                        ))
                    })?
                    .trim()
                    .to_string();
                result = result.replace(&format!("{{{{file.{}}}}}", file_path), &value);
            }
        }

        Ok(result)
    }
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "kodi": {"url": "http://kodi.local:8080/jsonrpc", "username": "kodi"},
            "notifier": "desktop",
            "notification_time": 4000,
            "playback_notification_id": 1812,
            "dismiss_action": "next",
            "commands": {
                "seek": {"jsonrpc": "{}", "notification": "ok"}
            }
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.kodi.url, "http://kodi.local:8080/jsonrpc");
        assert_eq!(config.notifier, NotifierKind::Desktop);
        assert_eq!(config.notification_time, 4000);
        assert_eq!(config.playback_notification_id.as_deref(), Some("1812"));
        assert_eq!(config.dismiss_action, DismissAction::Next);
        assert_eq!(config.commands["seek"].notification.as_deref(), Some("ok"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.kodi.url, DEFAULT_ENDPOINT);
        assert_eq!(config.notifier, NotifierKind::Kodi);
        assert_eq!(config.notification_time, 6000);
        assert_eq!(config.dismiss_action, DismissAction::Stop);
        assert!(config.commands.is_empty());

        let settings = config.dispatcher_settings();
        assert_eq!(settings.temp_path, std::env::temp_dir());
        assert_eq!(settings.notification_time, 6000);
    }

    #[test]
    fn test_invalid_json() {
        let err = Config::from_json(r#"{"notification_time": "soon"}"#).unwrap_err();
        assert!(err.to_string().contains("notification_time"));
    }

    #[test]
    fn test_env_var_resolution() {
        std::env::set_var("PUSHKODI_TEST_PASSWORD", "secret_value");
        let resolved = Config::resolve_secret_string("prefix_{{env.PUSHKODI_TEST_PASSWORD}}_suffix").unwrap();
        assert_eq!(resolved, "prefix_secret_value_suffix");
    }

    #[test]
    fn test_missing_env_var() {
        let err = Config::resolve_secret_string("{{env.PUSHKODI_SURELY_UNSET_VAR}}").unwrap_err();
        assert!(err.to_string().contains("PUSHKODI_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_load_resolves_file_secret_and_commands_file() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("password");
        fs::write(&secret, "hunter2\n").unwrap();

        let commands = dir.path().join("commands.json");
        fs::write(
            &commands,
            r#"{"seek": {"JSONRPC": "from-file"}, "clean": {"jsonrpc": "clean"}}"#,
        )
        .unwrap();

        let config_path = dir.path().join("config.json");
        let config_json = serde_json::json!({
            "kodi": {"username": "kodi", "password": format!("{{{{file.{}}}}}", secret.display())},
            "commands": {"seek": {"jsonrpc": "inline"}},
            "commands_file": commands.to_string_lossy(),
        });
        fs::write(&config_path, config_json.to_string()).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.kodi.password.as_deref(), Some("hunter2"));
        assert_eq!(config.commands["seek"].jsonrpc, "inline");
        assert_eq!(config.commands["clean"].jsonrpc, "clean");
    }

    #[test]
    fn test_string_overrides() {
        let config = Config::from_json(r#"{"strings": {"30104": "Ran %s", "title": "x"}}"#).unwrap();
        let overrides = config.string_overrides();
        assert_eq!(overrides.get(&30104).map(String::as_str), Some("Ran %s"));
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::from_json(r#"{"kodi": {"password": "topsecret"}}"#).unwrap();
        assert!(!format!("{:?}", config).contains("topsecret"));
    }
}
