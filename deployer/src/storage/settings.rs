//! Settings file management

use serde::{Deserialize, Serialize};

use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::models::selection::Model;

/// deployerai settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Decision oracle configuration
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Repository host configuration
    #[serde(default)]
    pub github: GitHubSettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(file: &File) -> Result<Self, DeployerError> {
        let settings: Settings = file.read_json().await.map_err(|e| {
            DeployerError::ConfigError(format!(
                "unable to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<(), DeployerError> {
        if self.github.repositories.is_empty() {
            return Err(DeployerError::ConfigError(
                "github.repositories must list at least one repository".to_string(),
            ));
        }
        if self.oracle.timeout_secs == 0 || self.github.timeout_secs == 0 {
            return Err(DeployerError::ConfigError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decision oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Base URL of the chat-completions API
    #[serde(default = "default_oracle_url")]
    pub base_url: String,

    /// Model to consult
    #[serde(default)]
    pub model: Model,

    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

fn default_oracle_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_oracle_timeout() -> u64 {
    60
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            model: Model::default(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

/// Repository host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    /// Base URL of the REST API
    #[serde(default = "default_github_url")]
    pub base_url: String,

    /// Organization or user owning the repositories
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repositories searched for review requests, in order
    #[serde(default = "default_repositories")]
    pub repositories: Vec<String>,

    /// Restrict ticket identifiers to this prefix, e.g. "OM"
    #[serde(default)]
    pub ticket_prefix: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "omiq-ai".to_string()
}

fn default_repositories() -> Vec<String> {
    vec!["platform".to_string(), "webapp".to_string()]
}

fn default_github_timeout() -> u64 {
    30
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            base_url: default_github_url(),
            owner: default_owner(),
            repositories: default_repositories(),
            ticket_prefix: None,
            timeout_secs: default_github_timeout(),
        }
    }
}
