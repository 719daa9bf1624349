//! Pull-request API client

use api_models::models::pulls::{PullRequest, PullState};
use tracing::{debug, warn};

use crate::errors::DeployerError;
use crate::http::client::HttpClient;

/// Page size requested from the listing endpoint (the API maximum)
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages followed for one repository
pub const MAX_PAGES: u32 = 50;

impl HttpClient {
    /// List one page of pull requests for a repository
    pub async fn list_pulls_page(
        &self,
        owner: &str,
        repo: &str,
        state: PullState,
        page: u32,
    ) -> Result<Vec<PullRequest>, DeployerError> {
        let path = format!("/repos/{}/{}/pulls", owner, repo);
        let query = [
            ("state", state.as_str().to_string()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        self.get(&path, &query).await
    }

    /// List every pull request in the given state, following pages until a
    /// short page comes back. A listing still full after `MAX_PAGES` pages is
    /// an error rather than a silently truncated result.
    pub async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        state: PullState,
    ) -> Result<Vec<PullRequest>, DeployerError> {
        let mut pulls = Vec::new();

        for page in 1..=MAX_PAGES {
            let batch = self.list_pulls_page(owner, repo, state, page).await?;
            let len = batch.len();
            pulls.extend(batch);
            debug!("{}/{} page {}: {} pull requests", owner, repo, page, len);

            if len < PAGE_SIZE {
                return Ok(pulls);
            }
        }

        warn!(
            "{}/{} still had full pages after {} pages ({} pull requests)",
            owner,
            repo,
            MAX_PAGES,
            pulls.len()
        );
        Err(DeployerError::DecodeError(format!(
            "pull request listing for {}/{} did not end within {} pages",
            owner, repo, MAX_PAGES
        )))
    }
}
