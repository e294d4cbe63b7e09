//! GitHub REST API client
//!
//! Thin wrapper used for downstream-repository notification: opens a pull
//! request against a downstream repository. Transient failures (network,
//! 5xx, rate limiting) are retried with exponential backoff.

use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::defaults;

/// Downstream notification errors
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No GitHub token available
    #[error("No GitHub token found. Set {0} to enable downstream notification.")]
    MissingToken(String),

    /// API rejected the request
    #[error("GitHub API error for '{repo}': HTTP {status}: {message}")]
    ApiError {
        repo: String,
        status: u16,
        message: String,
    },

    /// Network failure after retries
    #[error("Network error calling GitHub for '{repo}': {error}")]
    NetworkError { repo: String, error: String },

    /// Response body did not match the expected shape
    #[error("Unexpected GitHub response for '{repo}': {error}")]
    InvalidResponse { repo: String, error: String },
}

/// Pull request creation payload
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestSpec {
    /// PR title
    pub title: String,
    /// Head branch carrying the dependency update
    pub head: String,
    /// Base branch the PR targets
    pub base: String,
    /// PR body
    pub body: String,
}

/// Created pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Browser URL
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// GitHub client for downstream notification
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl GithubClient {
    /// Create a client with the default API base URL
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, defaults::GITHUB_API_BASE.to_string())
    }

    /// Create a client against a custom API base URL
    pub fn with_base_url(token: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base,
            token,
        }
    }

    /// Create a client from the environment token variables
    pub fn from_env() -> Result<Self, NotifyError> {
        for var in defaults::GITHUB_TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Ok(Self::new(token));
                }
            }
        }
        Err(NotifyError::MissingToken(
            defaults::GITHUB_TOKEN_ENV_VARS.join(" or "),
        ))
    }

    /// The API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Open a pull request against `repo` ("owner/name").
    ///
    /// Retries transient failures with exponential backoff; 4xx responses
    /// other than rate limiting fail immediately.
    pub async fn open_pull_request(
        &self,
        repo: &str,
        spec: &PullRequestSpec,
    ) -> Result<PullRequest, NotifyError> {
        let url = format!("{}/repos/{repo}/pulls", self.api_base);

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(Duration::from_secs(30)))
            .build();

        backoff::future::retry(policy, || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "monoforge")
                .json(spec)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(NotifyError::NetworkError {
                        repo: repo.to_string(),
                        error: e.to_string(),
                    })
                })?;

            let status = response.status();
            if status.is_success() {
                return response.json::<PullRequest>().await.map_err(|e| {
                    backoff::Error::permanent(NotifyError::InvalidResponse {
                        repo: repo.to_string(),
                        error: e.to_string(),
                    })
                });
            }

            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| "no error detail".to_string());
            let error = NotifyError::ApiError {
                repo: repo.to_string(),
                status: status.as_u16(),
                message,
            };

            if status.is_server_error() || status.as_u16() == 429 {
                Err(backoff::Error::transient(error))
            } else {
                Err(backoff::Error::permanent(error))
            }
        })
        .await
    }
}
