//! Pull-request listing models

use serde::{Deserialize, Serialize};

/// Pull request state filter. Only open pull requests are ever listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
}

impl PullState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullState::Open => "open",
        }
    }
}

/// A pull request as returned by the repository listing endpoint.
///
/// Only the fields the resolver needs are modelled; the rest of the
/// payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub draft: Option<bool>,
}
