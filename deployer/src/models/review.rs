//! Review request models

use std::fmt;

use serde::{Deserialize, Serialize};

/// An open pull request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub title: String,
    pub number: u64,
    pub repo: String,
}

impl ReviewRequest {
    pub fn new(title: impl Into<String>, number: u64, repo: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            number,
            repo: repo.into(),
        }
    }
}

impl fmt::Display for ReviewRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} {}", self.repo, self.number, self.title)
    }
}

/// A normalized ticket identifier such as `OM-410`.
///
/// Built only through [`TicketPattern`](crate::resolve::pattern::TicketPattern),
/// which uppercases the prefix and joins it to the digits with `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub(crate) fn from_parts(prefix: &str, digits: &str) -> Self {
        Self(format!("{}-{}", prefix.to_uppercase(), digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
