use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "LAP_SLOTGEN_CONFIG";

const APP_DIR: &str = "lap-slotgen";
const CONFIG_FILE: &str = "lap-slotgen.toml";
const POINTER_FILE: &str = ".lap_slotgen_config_path";

/// User configuration: defaults applied when the command line leaves them out
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collision_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_name: Option<String>,
}

impl Config {
    /// Keys accepted by `get`/`set`
    pub const KEYS: &'static [&'static str] =
        &["strategy", "collision-policy", "format", "generator-name"];

    /// Directory holding the config and log files
    pub fn config_dir() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".config").join(APP_DIR),
                |h| h.join(".config").join(APP_DIR),
            )
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map_or_else(
                || PathBuf::from(APP_DIR),
                |c| c.join(APP_DIR),
            )
        }
    }

    pub fn path() -> PathBuf {
        // Explicit override for tests / isolated runs
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        let default = Self::default_path();

        // A pointer file next to the default config may redirect to another location
        if let Some(contents) = Self::read_pointer() {
            return PathBuf::from(contents);
        }

        default
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn pointer_path() -> PathBuf {
        Self::config_dir().join(POINTER_FILE)
    }

    /// Redirected config location, if a non-empty pointer file exists
    pub fn read_pointer() -> Option<String> {
        let contents = fs::read_to_string(Self::pointer_path()).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Point future runs at a different config file
    pub fn write_pointer(target: &str) -> Result<PathBuf, ConfigError> {
        let pointer = Self::pointer_path();
        if let Some(parent) = pointer.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&pointer, target.as_bytes()).map_err(|source| ConfigError::Io {
            path: pointer.clone(),
            source,
        })?;
        Ok(pointer)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path())
    }

    /// Load from a specific path; a missing file is an empty config
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_known_key(key: &str) -> bool {
        Self::KEYS.contains(&key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "strategy" => self.strategy.clone(),
            "collision-policy" => self.collision_policy.clone(),
            "format" => self.format.clone(),
            "generator-name" => self.generator_name.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "strategy" => self.strategy = Some(value),
            "collision-policy" => self.collision_policy = Some(value),
            "format" => self.format = Some(value),
            "generator-name" => self.generator_name = Some(value),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strategy.is_none()
            && self.collision_policy.is_none()
            && self.format.is_none()
            && self.generator_name.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|&key| self.get(key).map(|value| (key, value)))
            .collect()
    }
}
