use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// ~/.toneshare, or ./.toneshare when HOME is unset
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".toneshare")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Display identity stamped on published setups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    pub name: String,
    pub avatar: String,
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self {
            name: "Musician".to_string(),
            avatar: "https://picsum.photos/100/100?random=50".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    /// Program and arguments; empty means offline canned replies
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// What critiques steer towards
    pub style: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 30,
            style: crate::assist::prompt::DEFAULT_STYLE.to_string(),
        }
    }
}

impl AssistantSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library_dir: PathBuf,
    pub socket_path: PathBuf,
    pub assistant: AssistantSettings,
    pub user: UserIdentity,
    /// Open the editor with no pedals instead of the default one
    pub empty_chain: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_dir: data_dir().join("setups"),
            socket_path: PathBuf::from("/tmp/toneshare.sock"),
            assistant: AssistantSettings::default(),
            user: UserIdentity::default(),
            empty_chain: false,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
