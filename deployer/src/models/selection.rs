//! Target selection models

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DeployerError;

/// A candidate environment that can receive a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    /// Target name, unique within a request
    #[serde(rename = "deployment_target_name")]
    pub name: String,

    /// Image currently running on the target
    #[serde(rename = "currently_deployed_image")]
    pub current_image: String,

    /// When the current image was deployed
    #[serde(rename = "current_image_deployment_time")]
    pub current_image_deployed_at: DateTime<Utc>,

    /// When the target was last restarted
    #[serde(rename = "last_restart_time")]
    pub last_restart: DateTime<Utc>,

    /// When the target was last used. `None` means never used.
    #[serde(rename = "last_used_time", default, with = "never_used")]
    pub last_used: Option<DateTime<Utc>>,
}

impl DeploymentTarget {
    pub fn is_unused(&self) -> bool {
        self.last_used.is_none()
    }
}

/// Serializes "never used" as the zero timestamp and reads it back as `None`
mod never_used {
    use super::*;

    fn zero_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ts = value.unwrap_or_else(zero_time);
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
        Ok(value.filter(|ts| ts.year() > 1))
    }
}

/// A deployment request sent to the decision oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// What the developer asked for, e.g. "Please deploy pr-1462"
    #[serde(rename = "message_from_developer")]
    pub message_from_user: String,

    /// Candidate targets, in caller order
    #[serde(rename = "possible_deployment_targets")]
    pub deployment_targets: Vec<DeploymentTarget>,

    /// Free-text operator notes
    #[serde(default)]
    pub additional_notes: String,
}

impl SelectionRequest {
    pub fn new(
        message_from_user: impl Into<String>,
        deployment_targets: Vec<DeploymentTarget>,
        additional_notes: impl Into<String>,
    ) -> Self {
        Self {
            message_from_user: message_from_user.into(),
            deployment_targets,
            additional_notes: additional_notes.into(),
        }
    }

    /// Check the request can possibly produce a valid outcome
    pub fn validate(&self) -> Result<(), DeployerError> {
        if self.message_from_user.trim().is_empty() {
            return Err(DeployerError::ConstructionError(
                "deployment request message is empty".to_string(),
            ));
        }

        if self.deployment_targets.is_empty() {
            return Err(DeployerError::ConstructionError(
                "no deployment targets supplied".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.deployment_targets {
            if target.name.trim().is_empty() {
                return Err(DeployerError::ConstructionError(
                    "deployment target with empty name".to_string(),
                ));
            }
            if !seen.insert(target.name.as_str()) {
                return Err(DeployerError::ConstructionError(format!(
                    "duplicate deployment target name: {}",
                    target.name
                )));
            }
        }

        Ok(())
    }

    /// Look up a target by exact name
    pub fn target(&self, name: &str) -> Option<&DeploymentTarget> {
        self.deployment_targets.iter().find(|t| t.name == name)
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.deployment_targets.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A validated decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    /// Chosen target; always one of the request's target names
    pub deployment_target_name: String,

    /// Image to deploy on the chosen target
    pub deployment_image: String,

    /// Justification for the developer
    pub message: String,
}

/// Model selector for the decision oracle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Model {
    #[default]
    Gpt4,
    Gpt35,
    Custom(String),
}

impl Model {
    pub const GPT4: &'static str = "gpt-4-0125-preview";
    pub const GPT35: &'static str = "gpt-3.5-turbo-0125";

    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt4 => Self::GPT4,
            Model::Gpt35 => Self::GPT35,
            Model::Custom(name) => name,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err("Model name is empty".to_string()),
            "gpt4" | "gpt-4" | Self::GPT4 => Ok(Model::Gpt4),
            "gpt3" | "gpt-3.5" | Self::GPT35 => Ok(Model::Gpt35),
            _ => Ok(Model::Custom(s.to_string())),
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
