use crate::cli::ConnectionArgs;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use lfgweb_core::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// What `lfgweb` remembers between runs.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Settings {
    pub url: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_message_size: Option<usize>,
}

impl Settings {
    /// Builds the client configuration. Command-line flags win over stored values.
    pub fn client_config(&self, args: &ConnectionArgs) -> ClientConfig {
        let mut config = match args.url.as_ref().or(self.url.as_ref()) {
            Some(url) => ClientConfig::new(url.clone()),
            None => ClientConfig::default(),
        };

        if let Some(token) = args.token.as_ref().or(self.auth_token.as_ref()) {
            config = config.with_auth_token(token.clone());
        }
        if let Some(secs) = args.timeout.or(self.timeout_secs) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_message_size {
            config = config.with_max_message_size(max);
        }

        config
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "lfgweb", "lfgweb")
            .context("Could not determine config directory")?;

        Ok(Self {
            config_path: proj_dirs.config_dir().join("config.json"),
        })
    }

    pub fn at(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read {}", self.config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", self.config_path.display()))
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }
}
