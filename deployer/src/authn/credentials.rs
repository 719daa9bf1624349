//! Access credentials for the remote services

use secrecy::{ExposeSecret, SecretString};

use crate::errors::DeployerError;

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Bearer tokens injected into the clients at construction time
#[derive(Debug, Default)]
pub struct Credentials {
    oracle_api_key: Option<SecretString>,
    github_token: Option<SecretString>,
}

impl Credentials {
    pub fn new(oracle_api_key: Option<String>, github_token: Option<String>) -> Self {
        Self {
            oracle_api_key: oracle_api_key.map(SecretString::from),
            github_token: github_token.map(SecretString::from),
        }
    }

    /// Read both tokens from the process environment
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(OPENAI_API_KEY_VAR).ok(),
            std::env::var(GITHUB_TOKEN_VAR).ok(),
        )
    }

    pub fn oracle_api_key(&self) -> Result<SecretString, DeployerError> {
        require(self.oracle_api_key.as_ref(), OPENAI_API_KEY_VAR)
    }

    pub fn github_token(&self) -> Result<SecretString, DeployerError> {
        require(self.github_token.as_ref(), GITHUB_TOKEN_VAR)
    }
}

fn require(secret: Option<&SecretString>, var: &str) -> Result<SecretString, DeployerError> {
    match secret {
        Some(s) if !s.expose_secret().trim().is_empty() => {
            Ok(SecretString::from(s.expose_secret().to_string()))
        }
        _ => Err(DeployerError::CredentialError(format!("{} is not set", var))),
    }
}
