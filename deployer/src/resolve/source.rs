//! Sources of open review requests

use std::time::Duration;

use api_models::models::pulls::PullState;
use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::DeployerError;
use crate::http::client::{HttpClient, HttpOptions};
use crate::models::review::ReviewRequest;

/// Lists the open review requests of one repository
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_open(&self, repo: &str) -> Result<Vec<ReviewRequest>, DeployerError>;
}

/// Pull requests from a GitHub-compatible API, scoped to one owner
#[derive(Debug)]
pub struct GitHubSource {
    http: HttpClient,
    owner: String,
}

impl GitHubSource {
    pub fn new(
        base_url: &str,
        owner: &str,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, DeployerError> {
        if owner.trim().is_empty() {
            return Err(DeployerError::ConfigError(
                "repository owner is not configured".to_string(),
            ));
        }

        let http = HttpClient::new(
            base_url,
            token,
            HttpOptions {
                timeout,
                default_headers: vec![
                    ("accept", "application/vnd.github+json".to_string()),
                    ("x-github-api-version", "2022-11-28".to_string()),
                ],
            },
        )?;

        Ok(Self {
            http,
            owner: owner.to_string(),
        })
    }
}

#[async_trait]
impl ReviewSource for GitHubSource {
    async fn list_open(&self, repo: &str) -> Result<Vec<ReviewRequest>, DeployerError> {
        let pulls = self.http.list_pulls(&self.owner, repo, PullState::Open).await?;
        Ok(pulls
            .into_iter()
            .map(|pr| ReviewRequest::new(pr.title, pr.number, repo))
            .collect())
    }
}
