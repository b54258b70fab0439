use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::search_job::{JobStatus, MessagePage, SearchJob, SearchJobRequest};
use crate::{Credentials, SearchJobUrl};

#[derive(Error, Debug)]
pub enum SumoApiError {
    #[error("authorization failed, check the configured access id and access key")]
    Unauthorized,
    #[error("rate limited by the search API, retry later with fewer indicators")]
    RateLimited,
    #[error("client error ({status}): {message}")]
    Client { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to parse response: {0}")]
    Parsing(String),
}

/// Retry policy for individual API calls. Transient failures (network
/// errors and retriable 5xx) are retried with a fixed delay between
/// attempts; everything else surfaces immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            delay: Duration::from_millis(1000),
        }
    }
}

pub struct SumoClient {
    credentials: Credentials,
    base_url: SearchJobUrl,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl SumoClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, SearchJobUrl::default())
    }

    pub fn with_base_url(credentials: Credentials, base_url: SearchJobUrl) -> Self {
        Self {
            credentials,
            base_url,
            http: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `POST /v1/search/jobs` — submit an asynchronous search job.
    pub async fn create_search_job(
        &self,
        request: &SearchJobRequest,
    ) -> Result<SearchJob, SumoApiError> {
        let url = self.base_url.append_path("/v1/search/jobs");
        self.request(Method::POST, url, Some(request)).await
    }

    /// `GET /v1/search/jobs/{id}` — read the current job state.
    pub async fn search_job_status(&self, job_id: &str) -> Result<JobStatus, SumoApiError> {
        let url = self.base_url.append_path("/v1/search/jobs").append_path(job_id);
        self.request(Method::GET, url, None::<&()>).await
    }

    /// `GET /v1/search/jobs/{id}/messages` — fetch one page of results for
    /// a finished job.
    pub async fn search_job_messages(
        &self,
        job_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, SumoApiError> {
        let url = self
            .base_url
            .append_path("/v1/search/jobs")
            .append_path(job_id)
            .append_path("messages")
            .with_paging(offset, limit);
        self.request(Method::GET, url, None::<&()>).await
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: SearchJobUrl,
        body: Option<&B>,
    ) -> Result<T, SumoApiError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut req = self
                .http
                .request(method.clone(), url.as_ref())
                .header(
                    header::AUTHORIZATION,
                    self.credentials.as_basic_auth_header(),
                )
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<T>()
                            .await
                            .map_err(|e| SumoApiError::Parsing(e.to_string()));
                    }

                    match classify_status(status) {
                        StatusClass::Unauthorized => return Err(SumoApiError::Unauthorized),
                        StatusClass::RateLimited => return Err(SumoApiError::RateLimited),
                        StatusClass::Client => {
                            let message = resp.text().await.unwrap_or_default();
                            return Err(SumoApiError::Client {
                                status: status.as_u16(),
                                message,
                            });
                        }
                        StatusClass::Transient => {
                            if attempt >= self.retry.max_attempts {
                                return Err(SumoApiError::Transport(format!(
                                    "{} after {} attempts",
                                    status, attempt
                                )));
                            }
                            warn!(%status, attempt, "transient search API failure, retrying");
                        }
                    }
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(SumoApiError::Transport(e.to_string()));
                    }
                    warn!(error = %e, attempt, "search API request failed, retrying");
                }
            }

            tokio::time::sleep(self.retry.delay).await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusClass {
    Unauthorized,
    RateLimited,
    Client,
    Transient,
}

/// 429/503 are rate-limit responses and are surfaced immediately with a
/// distinct error rather than retried.
pub(crate) fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StatusClass::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            StatusClass::RateLimited
        }
        s if s.is_client_error() => StatusClass::Client,
        _ => StatusClass::Transient,
    }
}
