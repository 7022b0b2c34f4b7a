use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ChatError;

const GPTREPLY_API_URL: &str = "GPTREPLY_API_URL";
const GPTREPLY_API_KEY: &str = "GPTREPLY_API_KEY";
const GPTREPLY_MODEL: &str = "GPTREPLY_MODEL";

pub const CONFIG_KEYS: [&str; 3] = ["api_url", "api_key", "model"];

/// Anything that can hand the client a fresh configuration.
///
/// Called once per attempt, so implementations should not cache.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<ChatConfig, ChatError>;
}

#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_api_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl ChatConfig {
    #[cfg(test)]
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        ChatConfig {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.api_url.is_empty() {
            return Err(ChatError::Config("api url required".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(ChatError::Config("api key required".to_string()));
        }
        Ok(())
    }

    /// Full URL of the chat completions endpoint.
    ///
    /// A malformed `api_url` is a request error, retried like any other.
    pub fn completions_url(&self) -> Result<Url, ChatError> {
        let endpoint = format!("{}/v1/chat/completions", self.api_url.trim_end_matches('/'));
        Url::parse(&endpoint)
            .map_err(|e| ChatError::Request(format!("invalid api url {}: {}", self.api_url, e)))
    }

    pub fn get(&self, key: &str) -> Result<&str, ChatError> {
        match key {
            "api_url" => Ok(&self.api_url),
            "api_key" => Ok(&self.api_key),
            "model" => Ok(&self.model),
            _ => Err(unknown_key(key)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ChatError> {
        let slot = match key {
            "api_url" => &mut self.api_url,
            "api_key" => &mut self.api_key,
            "model" => &mut self.model,
            _ => return Err(unknown_key(key)),
        };
        *slot = value.to_string();
        Ok(())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup(GPTREPLY_API_URL) {
            self.api_url = api_url;
        }
        if let Some(api_key) = lookup(GPTREPLY_API_KEY) {
            self.api_key = api_key;
        }
        if let Some(model) = lookup(GPTREPLY_MODEL) {
            self.model = model;
        }
        self
    }
}

fn unknown_key(key: &str) -> ChatError {
    ChatError::Config(format!(
        "unknown config key '{}', expected one of {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

/// A fixed configuration, handy for tests and embedding.
impl ConfigSource for ChatConfig {
    fn load(&self) -> Result<ChatConfig, ChatError> {
        Ok(self.clone())
    }
}

/// Configuration read from `gptreply.toml`, re-read on every load.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
    env_overrides: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig::new(get_gptreply_config_path())
    }
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfig {
            path: path.into(),
            env_overrides: true,
        }
    }

    #[cfg(test)]
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's contents without environment overrides.
    pub fn read_file(&self) -> Result<ChatConfig, ChatError> {
        if !self.path.exists() {
            debug!("No config file at {}, using defaults", self.path.display());
            return Ok(ChatConfig::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ChatError::Config(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ChatError::Config(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    pub fn write_file(&self, config: &ChatConfig) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChatError::Config(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let toml_str = toml::to_string_pretty(config)
            .map_err(|e| ChatError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&self.path, toml_str).map_err(|e| {
            ChatError::Config(format!("failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Effective value of `key`, environment overrides included.
    pub fn get_value(&self, key: &str) -> Result<String, ChatError> {
        self.load()?.get(key).map(str::to_string)
    }

    /// Persist an assignment of the form `key=value`.
    pub fn set_value(&self, assignment: &str) -> Result<(), ChatError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ChatError::Config(format!("expected key=value, got '{}'", assignment))
        })?;
        let mut config = self.read_file()?;
        config.set(key.trim(), value.trim())?;
        self.write_file(&config)
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<ChatConfig, ChatError> {
        let config = self.read_file()?;
        if !self.env_overrides {
            return Ok(config);
        }
        Ok(config.apply_overrides(|name| env::var(name).ok()))
    }
}

fn get_gptreply_config_path() -> PathBuf {
    let mut path = config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("gptreply");
    path.push("gptreply.toml");
    path
}
