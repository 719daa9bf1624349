//! Application state: settings and credentials, and the clients built from them

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::authn::credentials::Credentials;
use crate::errors::DeployerError;
use crate::resolve::pattern::TicketPattern;
use crate::resolve::resolver::TicketResolver;
use crate::resolve::source::GitHubSource;
use crate::select::client::TargetSelector;
use crate::select::oracle::{ChatCompletionsOracle, DecisionOracle};
use crate::select::rules::RuleEvaluator;
use crate::storage::settings::Settings;

/// Main application state
pub struct AppState {
    pub settings: Settings,
    credentials: Credentials,
}

impl AppState {
    pub fn new(settings: Settings, credentials: Credentials) -> Self {
        Self {
            settings,
            credentials,
        }
    }

    /// Build a target selector. `local` selects the rule evaluator instead of
    /// the remote oracle, which then needs no credential.
    pub fn selector(&self, local: bool) -> Result<TargetSelector, DeployerError> {
        let oracle: Arc<dyn DecisionOracle> = if local {
            Arc::new(RuleEvaluator::new()?)
        } else {
            let oracle = &self.settings.oracle;
            Arc::new(ChatCompletionsOracle::new(
                &oracle.base_url,
                self.credentials.oracle_api_key()?,
                Duration::from_secs(oracle.timeout_secs),
            )?)
        };

        info!("Using {} decision oracle", oracle.name());
        Ok(TargetSelector::new(oracle))
    }

    /// Build a ticket resolver over the configured repositories
    pub fn resolver(&self) -> Result<TicketResolver, DeployerError> {
        let github = &self.settings.github;
        let source = GitHubSource::new(
            &github.base_url,
            &github.owner,
            self.credentials.github_token()?,
            Duration::from_secs(github.timeout_secs),
        )?;
        let pattern = TicketPattern::from_config(github.ticket_prefix.as_deref())?;

        TicketResolver::new(Arc::new(source), github.repositories.clone(), pattern)
    }
}
