//! HTTP challenge client

use crate::transform::derive_key;
use async_trait::async_trait;
use reqwest::{Client, Url};
use scriptorium_core::{ChallengeError, ChallengeSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Challenge service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    /// Service URL; `None` leaves the resolver unconfigured
    pub endpoint: Option<String>,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ChallengeConfig {
    /// With endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeReply {
    #[serde(default)]
    success: bool,
    challenge: Option<Challenge>,
}

#[derive(Debug, Deserialize)]
struct Challenge {
    vault: Vec<String>,
    targets: Vec<usize>,
}

/// Resolves challenge codes against the remote service
#[derive(Debug, Clone)]
pub struct ChallengeResolver {
    client: Client,
    endpoint: Option<Url>,
}

impl ChallengeResolver {
    /// Build a resolver from `config`
    ///
    /// A missing or blank endpoint is accepted here and reported by
    /// [`ChallengeSource::ensure_configured`].
    ///
    /// # Errors
    /// `InvalidEndpoint` if the endpoint is not an absolute URL.
    pub fn new(config: &ChallengeConfig) -> Result<Self, ChallengeError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| Url::parse(raw).map_err(|_| ChallengeError::InvalidEndpoint(raw.to_string())))
            .transpose()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self { client, endpoint })
    }

    /// Request URL for one challenge
    ///
    /// # Errors
    /// `EndpointNotConfigured` if no endpoint was set.
    pub fn request_url(&self, title: &str, unlock_code: &str) -> Result<Url, ChallengeError> {
        let mut url = self
            .endpoint
            .clone()
            .ok_or(ChallengeError::EndpointNotConfigured)?;
        url.query_pairs_mut()
            .append_pair("bookTitle", title)
            .append_pair("unlockCode", unlock_code);
        Ok(url)
    }

    async fn fetch(&self, url: Url, title: &str) -> Option<ChallengeReply> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    tracing::warn!(title, "Challenge request timed out");
                } else {
                    tracing::warn!(title, error = %e, "Challenge request failed");
                }
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(title, status = %status, "Challenge service rejected request");
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(title, error = %e, "Failed to read challenge response");
                return None;
            }
        };

        match serde_json::from_str::<ChallengeReply>(&body) {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!(title, error = %e, "Malformed challenge response");
                None
            }
        }
    }
}

#[async_trait]
impl ChallengeSource for ChallengeResolver {
    fn ensure_configured(&self) -> Result<(), ChallengeError> {
        if self.endpoint.is_some() {
            Ok(())
        } else {
            Err(ChallengeError::EndpointNotConfigured)
        }
    }

    async fn resolve(
        &self,
        title: &str,
        previous_key: &str,
    ) -> Result<Option<String>, ChallengeError> {
        let url = self.request_url(title, previous_key)?;
        tracing::debug!(title, "Requesting challenge");

        let Some(reply) = self.fetch(url, title).await else {
            return Ok(None);
        };

        let challenge = match reply {
            ChallengeReply {
                success: true,
                challenge: Some(challenge),
            } => challenge,
            _ => {
                tracing::warn!(title, "Challenge service returned no challenge");
                return Ok(None);
            }
        };

        let code = derive_key(&challenge.vault, &challenge.targets)?;
        tracing::info!(title, "Challenge code derived");
        Ok(Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_endpoint_is_unconfigured() {
        let resolver = ChallengeResolver::new(&ChallengeConfig::default().with_endpoint("  ")).unwrap();
        assert!(matches!(
            resolver.ensure_configured(),
            Err(ChallengeError::EndpointNotConfigured)
        ));
    }

    #[test]
    fn relative_endpoint_is_invalid() {
        let err = ChallengeResolver::new(&ChallengeConfig::default().with_endpoint("/challenge"))
            .unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidEndpoint(ref raw) if raw == "/challenge"));
    }

    #[test]
    fn request_url_encodes_parameters() {
        let resolver = ChallengeResolver::new(
            &ChallengeConfig::default().with_endpoint("https://archive.test/api/challenge?v=1"),
        )
        .unwrap();

        let url = resolver.request_url("Liber Vitae", "VITAE14").unwrap();

        assert_eq!(
            url.as_str(),
            "https://archive.test/api/challenge?v=1&bookTitle=Liber+Vitae&unlockCode=VITAE14"
        );
    }
}
