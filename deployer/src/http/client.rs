//! HTTP client implementation

use std::time::Duration;

use api_models::models::ErrorResponse;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::DeployerError;

/// Options for building an [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Whole-request timeout
    pub timeout: Duration,

    /// Extra headers sent with every request
    pub default_headers: Vec<(&'static str, String)>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_headers: Vec::new(),
        }
    }
}

/// Bearer-authenticated JSON client for one remote service
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// Fails with a credential error before any network activity when the
    /// token is blank.
    pub fn new(
        base_url: &str,
        token: SecretString,
        options: HttpOptions,
    ) -> Result<Self, DeployerError> {
        if token.expose_secret().trim().is_empty() {
            return Err(DeployerError::CredentialError(format!(
                "no access token configured for {}",
                base_url
            )));
        }

        url::Url::parse(base_url)
            .map_err(|e| DeployerError::ConfigError(format!("invalid base URL {}: {}", base_url, e)))?;

        let mut headers = header::HeaderMap::new();
        for (name, value) in &options.default_headers {
            let value = header::HeaderValue::from_str(value).map_err(|e| {
                DeployerError::ConfigError(format!("invalid value for header {}: {}", name, e))
            })?;
            headers.insert(*name, value);
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("deployerai/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DeployerError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await?;

        Self::read_json(response, "GET").await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployerError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await?;

        Self::read_json(response, "POST").await
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        method: &str,
    ) -> Result<T, DeployerError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => error!("HTTP {} failed: {} - {}", method, status, parsed.error.message),
                Err(_) => error!("HTTP {} failed: {} - {}", method, status, body),
            }
            return Err(DeployerError::StatusError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("HTTP {} returned an unreadable body: {}", method, e);
            DeployerError::DecodeError(e.to_string())
        })
    }
}
