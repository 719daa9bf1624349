//! Shared fixtures

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use tokio::net::TcpListener;

use deployerai::errors::DeployerError;
use deployerai::models::review::ReviewRequest;
use deployerai::models::selection::{DeploymentTarget, Model, SelectionRequest};
use deployerai::resolve::source::ReviewSource;
use deployerai::select::oracle::DecisionOracle;
use deployerai::select::policy::DecisionPrompt;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A target last used `days_ago` days ago, or never when `None`
pub fn target(name: &str, days_ago: Option<i64>) -> DeploymentTarget {
    let now = Utc::now();
    DeploymentTarget {
        name: name.to_string(),
        current_image: "pr-1377".to_string(),
        current_image_deployed_at: now - Duration::days(3),
        last_restart: now - Duration::days(3),
        last_used: days_ago.map(|d| now - Duration::days(d)),
    }
}

pub fn request(targets: Vec<DeploymentTarget>, notes: &str) -> SelectionRequest {
    SelectionRequest::new("Please deploy pr-1462", targets, notes)
}

/// Oracle that always gives the same reply and counts calls
pub struct ScriptedOracle {
    reply: String,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn choosing(name: &str) -> Arc<Self> {
        Self::new(format!(
            r#"{{"deployment_target_name":"{}","deployment_image":"pr-1462","message":"scripted"}}"#,
            name
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(
        &self,
        _model: &Model,
        _prompt: &DecisionPrompt,
        _request: &SelectionRequest,
    ) -> Result<String, DeployerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Oracle that never answers
pub struct SilentOracle;

#[async_trait]
impl DecisionOracle for SilentOracle {
    async fn decide(
        &self,
        _model: &Model,
        _prompt: &DecisionPrompt,
        _request: &SelectionRequest,
    ) -> Result<String, DeployerError> {
        std::future::pending::<()>().await;
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// In-memory repositories. A repository listed in `failing` answers with a
/// server error; one listed in `hanging` never answers.
#[derive(Default)]
pub struct MemorySource {
    pub repos: HashMap<String, Vec<ReviewRequest>>,
    pub failing: Vec<String>,
    pub hanging: Vec<String>,
    pub calls: AtomicUsize,
}

impl MemorySource {
    pub fn with_repo(mut self, repo: &str, titles: &[(u64, &str)]) -> Self {
        self.repos.insert(
            repo.to_string(),
            titles
                .iter()
                .map(|(n, t)| ReviewRequest::new(*t, *n, repo))
                .collect(),
        );
        self
    }

    pub fn failing(mut self, repo: &str) -> Self {
        self.failing.push(repo.to_string());
        self
    }

    pub fn hanging(mut self, repo: &str) -> Self {
        self.hanging.push(repo.to_string());
        self
    }
}

#[async_trait]
impl ReviewSource for MemorySource {
    async fn list_open(&self, repo: &str) -> Result<Vec<ReviewRequest>, DeployerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.iter().any(|r| r == repo) {
            std::future::pending::<()>().await;
        }
        if self.failing.iter().any(|r| r == repo) {
            return Err(DeployerError::StatusError {
                status: 502,
                body: format!("{} is unavailable", repo),
            });
        }
        Ok(self.repos.get(repo).cloned().unwrap_or_default())
    }
}
