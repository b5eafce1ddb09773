use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::model::AiModel;
use crate::prompt::Persona;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_model: Option<AiModel>,
    pub context_enabled: Option<bool>,
    pub persona: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save_default_model(model: AiModel) -> Result<()> {
        let mut config = Self::load().unwrap_or_default();
        config.default_model = Some(model);
        config.save()
    }

    /// Resolved API key: the `GEMINI_API_KEY` env var wins over the stored key.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn persona(&self) -> Persona {
        self.persona
            .as_deref()
            .and_then(Persona::from_str)
            .unwrap_or_default()
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    /// Directory holding the config file and log output.
    pub fn app_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("zenith"))
    }
}
