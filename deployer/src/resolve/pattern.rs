//! Ticket identifier pattern

use regex::Regex;

use crate::errors::DeployerError;
use crate::models::review::TicketId;

/// Longest alphabetic prefix accepted when no fixed prefix is configured
const MAX_PREFIX_LEN: usize = 10;

/// Recognizes a ticket identifier at the start of a title: an alphabetic
/// prefix, an optional space, `-` or `_`, then digits. Case-insensitive.
#[derive(Debug, Clone)]
pub struct TicketPattern {
    regex: Regex,
}

impl TicketPattern {
    /// Accept any 1-10 letter prefix
    pub fn any_prefix() -> Result<Self, DeployerError> {
        let source = format!(r"(?i)^([a-z]{{1,{}}})[ _-]?(\d+)", MAX_PREFIX_LEN);
        let regex = Regex::new(&source)
            .map_err(|e| DeployerError::ConfigError(format!("invalid ticket pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Accept only the given project prefix, e.g. `OM`
    pub fn with_prefix(prefix: &str) -> Result<Self, DeployerError> {
        let prefix = prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DeployerError::ConfigError(format!(
                "ticket prefix must be letters only, got {:?}",
                prefix
            )));
        }

        let regex = Regex::new(&format!(r"(?i)^({})[ _-]?(\d+)", prefix))
            .map_err(|e| DeployerError::ConfigError(format!("invalid ticket prefix: {}", e)))?;
        Ok(Self { regex })
    }

    /// Build from an optional configured prefix
    pub fn from_config(prefix: Option<&str>) -> Result<Self, DeployerError> {
        match prefix {
            Some(p) => Self::with_prefix(p),
            None => Self::any_prefix(),
        }
    }

    /// The ticket a title starts with, if any
    pub fn extract(&self, title: &str) -> Option<TicketId> {
        self.extract_with_len(title).map(|(id, _)| id)
    }

    fn extract_with_len(&self, text: &str) -> Option<(TicketId, usize)> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let prefix = caps.get(1)?.as_str();
        let digits = caps.get(2)?.as_str();
        Some((TicketId::from_parts(prefix, digits), whole.end()))
    }

    /// Normalize a user-supplied identifier. The whole input must be a ticket.
    pub fn normalize(&self, input: &str) -> Result<TicketId, DeployerError> {
        let trimmed = input.trim();
        match self.extract_with_len(trimmed) {
            Some((id, len)) if len == trimmed.len() => Ok(id),
            _ => Err(DeployerError::ConstructionError(format!(
                "{:?} is not a valid ticket identifier",
                input
            ))),
        }
    }
}
