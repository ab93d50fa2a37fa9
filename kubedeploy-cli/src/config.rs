///! CLI configuration management

use anyhow::{Context, Result};
use kubedeploy_client::context::DEFAULT_BASE_URL;
use kubedeploy_client::SyncConfig;
use kubedeploy_common::auth::{Session, User};
use kubedeploy_common::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: String,
    pub default_output: String,
    pub default_namespace: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub log_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub sync: SyncSettings,
}

/// `[sync]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    pub pods_interval_ms: u64,
    pub workloads_interval_ms: u64,
    pub endpoints_interval_ms: u64,
    pub namespaces_interval_ms: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_BASE_URL.to_string(),
            default_output: "table".to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            token: None,
            username: None,
            email: None,
            log_file: None,
            request_timeout_secs: 30,
            sync: SyncSettings::default(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            pods_interval_ms: 3000,
            workloads_interval_ms: 5000,
            endpoints_interval_ms: 5000,
            namespaces_interval_ms: 30000,
            retries: 1,
            retry_delay_ms: 1000,
        }
    }
}

impl From<&SyncSettings> for SyncConfig {
    fn from(s: &SyncSettings) -> Self {
        Self {
            pods_interval: Duration::from_millis(s.pods_interval_ms),
            workloads_interval: Duration::from_millis(s.workloads_interval_ms),
            endpoints_interval: Duration::from_millis(s.endpoints_interval_ms),
            namespaces_interval: Duration::from_millis(s.namespaces_interval_ms),
            retries: s.retries,
            retry_delay: Duration::from_millis(s.retry_delay_ms),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".config/kubedeploy/cli.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session persisted by the last login, if any
    pub fn session(&self) -> Option<Session> {
        let token = self.token.clone()?;
        Some(Session {
            token,
            user: User {
                id: 0,
                email: self.email.clone().unwrap_or_default(),
                username: self.username.clone().unwrap_or_default(),
                full_name: String::new(),
                role: "user".to_string(),
                active: true,
                created_at: None,
            },
        })
    }

    pub fn store_session(&mut self, session: &Session) {
        self.token = Some(session.token.clone());
        self.username = Some(session.user.username.clone());
        self.email = Some(session.user.email.clone());
    }

    pub fn clear_session(&mut self) {
        self.token = None;
        self.username = None;
        self.email = None;
    }
}
