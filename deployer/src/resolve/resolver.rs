//! Ticket-to-review resolver

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info, warn};

use crate::context::CallContext;
use crate::errors::DeployerError;
use crate::models::review::ReviewRequest;
use crate::resolve::pattern::TicketPattern;
use crate::resolve::source::ReviewSource;

/// Finds the single open review request for a ticket across repositories
#[derive(Clone)]
pub struct TicketResolver {
    source: Arc<dyn ReviewSource>,
    repositories: Vec<String>,
    pattern: TicketPattern,
}

impl TicketResolver {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        repositories: Vec<String>,
        pattern: TicketPattern,
    ) -> Result<Self, DeployerError> {
        if repositories.is_empty() {
            return Err(DeployerError::ConfigError(
                "no repositories configured for ticket resolution".to_string(),
            ));
        }
        if let Some(blank) = repositories.iter().find(|r| r.trim().is_empty()) {
            return Err(DeployerError::ConfigError(format!(
                "invalid repository name {:?}",
                blank
            )));
        }

        Ok(Self {
            source,
            repositories,
            pattern,
        })
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    /// Resolve a ticket identifier to its one open review request.
    ///
    /// Every repository is queried; a failure in any of them fails the whole
    /// resolution. Matches are pooled across repositories before the
    /// uniqueness check.
    pub async fn resolve_ticket(
        &self,
        ctx: &CallContext,
        ticket: &str,
    ) -> Result<ReviewRequest, DeployerError> {
        let ticket = self.pattern.normalize(ticket)?;
        info!(
            "Resolving {} across [{}]",
            ticket,
            self.repositories.join(", ")
        );

        let fetches = self.repositories.iter().map(|repo| async move {
            let open = self.source.list_open(repo).await.inspect_err(|e| {
                error!("Could not list open pull requests for {}: {}", repo, e);
            })?;
            debug!("{} has {} open pull requests", repo, open.len());
            Ok::<_, DeployerError>(open)
        });
        let listings = ctx.run(try_join_all(fetches)).await?;

        let mut matches: Vec<ReviewRequest> = listings
            .into_iter()
            .flatten()
            .filter(|pr| self.pattern.extract(&pr.title).as_ref() == Some(&ticket))
            .collect();

        match matches.len() {
            0 => {
                info!("No open pull request found for {}", ticket);
                Err(DeployerError::NotFound(ticket.to_string()))
            }
            1 => {
                let found = matches.remove(0);
                info!("Resolved {} to {}", ticket, found);
                Ok(found)
            }
            n => {
                warn!("{} open pull requests match {}", n, ticket);
                Err(DeployerError::Ambiguous {
                    ticket: ticket.to_string(),
                    candidates: matches,
                })
            }
        }
    }
}
