use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GiroError, Result};
use crate::taxonomy::Taxonomy;

/// A user-defined category appended to the built-in taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub id: String,
    pub title: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub output_dir: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub header: String,
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    #[serde(default = "default_properties")]
    pub properties: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CustomCategory>,
}

fn default_threshold() -> i64 {
    1000
}

fn default_properties() -> Vec<String> {
    vec!["Moosach".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            output_dir: String::new(),
            account: String::new(),
            header: String::new(),
            threshold: default_threshold(),
            properties: default_properties(),
            categories: Vec::new(),
        }
    }
}

impl Settings {
    /// Where reports go: `output_dir`, or `<data_dir>/berichte` when unset. `~` is expanded.
    pub fn output_path(&self) -> PathBuf {
        if self.output_dir.is_empty() {
            PathBuf::from(shellexpand_path(&self.data_dir)).join("berichte")
        } else {
            PathBuf::from(shellexpand_path(&self.output_dir))
        }
    }

    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::build(&self.properties, &self.categories)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("giro")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("giro")
}

/// Defaults when the file is missing; a file that does not parse is an error.
pub fn load_settings() -> Result<Settings> {
    let path = settings_path();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    parse_settings(&content).map_err(|e| GiroError::Settings(format!("{}: {e}", path.display())))
}

pub fn parse_settings(content: &str) -> std::result::Result<Settings, serde_json::Error> {
    serde_json::from_str(content)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| GiroError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
