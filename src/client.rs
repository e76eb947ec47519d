use std::error::Error;
use std::fmt;
use std::time::Duration;

use reqwest::{header::HeaderMap, Method, StatusCode, Url};
use serde::Serialize;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    decode::{error_message, parse_body},
    endpoint::{build_url, normalize_base_url},
    ApiClientError, ApiError, ApiRequest, ClientConfig, ErrorDetails, Payload, Query, Result,
};

#[derive(Clone)]
/// REST client with per-attempt timeout and bounded fixed-delay retry.
///
/// Every verb method resolves its endpoint against the configured base URL
/// and goes through [`ApiClient::request`].
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    authorization: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}

/// Response of a single successful attempt.
struct Reply {
    headers: HeaderMap,
    payload: Payload,
}

/// Why one attempt failed.
#[derive(Debug)]
enum AttemptFailure {
    Timeout { error: String },
    Network { status: Option<u16>, error: String },
    Status { status: StatusCode, message: String, response: Payload },
}

impl AttemptFailure {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                error: describe(&err),
            }
        } else {
            Self::Network {
                status: err.status().map(|status| status.as_u16()),
                error: describe(&err),
            }
        }
    }

    fn into_api_error(self, call: &CallContext, attempt: usize) -> ApiError {
        let (status, message, response_data, error) = match self {
            Self::Timeout { error } => (
                StatusCode::REQUEST_TIMEOUT.as_u16(),
                format!("Request timed out after {attempt} attempts"),
                None,
                Some(error),
            ),
            Self::Network { status, error } => (
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
                error.clone(),
                None,
                Some(error),
            ),
            Self::Status {
                status,
                message,
                response,
            } => (status.as_u16(), message, Some(response), None),
        };

        ApiError {
            status,
            message,
            details: ErrorDetails {
                url: call.url.to_string(),
                method: call.method.to_string(),
                response_data,
                error,
                attempt,
                max_retries: call.attempts,
            },
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { error } => write!(f, "timeout: {error}"),
            Self::Network { error, .. } => write!(f, "network error: {error}"),
            Self::Status {
                status, message, ..
            } => write!(f, "http {}: {message}", status.as_u16()),
        }
    }
}

/// Where a logical call stands after one attempt.
enum AttemptOutcome {
    Success(Reply),
    Retry(AttemptFailure),
    Failed(ApiError),
}

/// Fixed facts about one logical call.
struct CallContext {
    method: Method,
    url: Url,
    attempts: usize,
}

impl CallContext {
    fn settle(
        &self,
        result: std::result::Result<Reply, AttemptFailure>,
        attempt: usize,
    ) -> AttemptOutcome {
        match result {
            Ok(reply) => AttemptOutcome::Success(reply),
            Err(failure) if attempt < self.attempts => AttemptOutcome::Retry(failure),
            Err(failure) => AttemptOutcome::Failed(failure.into_api_error(self, attempt)),
        }
    }
}

impl ApiClient {
    /// Creates a client for `base_url` with default timeout and retry settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Creates a client from a full config. Trailing slashes are stripped from the base URL.
    pub fn with_config(mut config: ClientConfig) -> Self {
        config.base_url = normalize_base_url(&config.base_url);
        Self {
            http: reqwest::Client::new(),
            config,
            authorization: None,
        }
    }

    /// Creates a client from `API_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Sends `Authorization: Bearer <token>` on every subsequent request.
    ///
    /// If the token already carries the `Bearer ` prefix it is kept as is.
    pub fn set_token(&mut self, token: impl AsRef<str>) {
        self.authorization = Some(normalize_bearer_authorization(token.as_ref()));
    }

    /// Stops sending the authorization header.
    pub fn clear_token(&mut self) {
        self.authorization = None;
    }

    /// Builder form of [`ApiClient::set_token`].
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        self.set_token(token);
        self
    }

    pub fn has_token(&self) -> bool {
        self.authorization.is_some()
    }

    pub async fn get(&self, endpoint: &str, query: impl Into<Query>) -> Result<Payload> {
        self.request(ApiRequest::get(endpoint).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        query: impl Into<Query>,
    ) -> Result<Payload> {
        self.request(ApiRequest::post(endpoint).query(query).json(body)?)
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        query: impl Into<Query>,
    ) -> Result<Payload> {
        self.request(ApiRequest::put(endpoint).query(query).json(body)?)
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        query: impl Into<Query>,
    ) -> Result<Payload> {
        self.request(ApiRequest::patch(endpoint).query(query).json(body)?)
            .await
    }

    /// Sends a DELETE without body. Use [`ApiRequest::delete`] with
    /// [`ApiRequest::json`] when the endpoint expects one.
    pub async fn delete(&self, endpoint: &str, query: impl Into<Query>) -> Result<Payload> {
        self.request(ApiRequest::delete(endpoint).query(query)).await
    }

    /// Sends a HEAD request and returns the response headers.
    pub async fn head(&self, endpoint: &str, query: impl Into<Query>) -> Result<HeaderMap> {
        let reply = self
            .execute(ApiRequest::head(endpoint).query(query), None)
            .await?;
        Ok(reply.headers)
    }

    /// Runs a request through the timeout and retry protocol.
    pub async fn request(&self, request: ApiRequest) -> Result<Payload> {
        Ok(self.execute(request, None).await?.payload)
    }

    /// Same as [`ApiClient::request`], abandoned as soon as `cancel` fires.
    ///
    /// Cancellation drops the in-flight attempt or the pending retry delay and
    /// returns [`ApiClientError::Cancelled`].
    pub async fn request_with_cancel(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<Payload> {
        Ok(self.execute(request, Some(cancel)).await?.payload)
    }

    async fn execute(
        &self,
        request: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Reply> {
        let url = build_url(&self.config.base_url, &request.endpoint, &request.query)?;
        let headers = request.header_map(self.authorization.as_deref())?;
        let body = request.body_text();
        let call = CallContext {
            method: request.method,
            url,
            attempts: self.config.attempts(),
        };

        let mut attempt = 1usize;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %call.method,
                url = %call.url,
                headers = ?redact_headers(&headers),
                body = body.as_deref().unwrap_or(""),
                attempt,
                max_retries = call.attempts,
                "sending request"
            );

            let result = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ApiClientError::Cancelled),
                    result = self.attempt(&call, &headers, body.as_deref()) => result,
                },
                None => self.attempt(&call, &headers, body.as_deref()).await,
            };

            match call.settle(result, attempt) {
                AttemptOutcome::Success(reply) => return Ok(reply),
                AttemptOutcome::Retry(failure) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        method = %call.method,
                        url = %call.url,
                        attempt,
                        max_retries = call.attempts,
                        error = %failure,
                        "request attempt failed, retrying in {} ms",
                        self.config.retry_delay_ms
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = failure;

                    self.wait_before_retry(cancel).await?;
                    attempt += 1;
                }
                AttemptOutcome::Failed(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        method = %err.details.method,
                        url = %err.details.url,
                        attempt = err.details.attempt,
                        max_retries = err.details.max_retries,
                        status = err.status,
                        "request failed: {}",
                        err.message
                    );
                    return Err(err.into());
                }
            }
        }
    }

    async fn attempt(
        &self,
        call: &CallContext,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> std::result::Result<Reply, AttemptFailure> {
        let mut builder = self
            .http
            .request(call.method.clone(), call.url.clone())
            .headers(headers.clone())
            .timeout(Duration::from_millis(self.config.timeout_ms));
        if let Some(body) = body {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(AttemptFailure::from_transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(AttemptFailure::from_transport)?;

        if !status.is_success() {
            let response = parse_body(text.clone());
            let message = error_message(&response, &text, status);
            return Err(AttemptFailure::Status {
                status,
                message,
                response,
            });
        }

        Ok(Reply {
            headers,
            payload: parse_body(text),
        })
    }

    /// Sleeps the fixed retry delay, unless the caller cancels first.
    async fn wait_before_retry(&self, cancel: Option<&CancellationToken>) -> Result<()> {
        let delay = Duration::from_millis(self.config.retry_delay_ms);
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ApiClientError::Cancelled),
                _ = sleep(delay) => Ok(()),
            },
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

/// Formats a transport error together with its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(feature = "tracing")]
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    use reqwest::header::{HeaderValue, AUTHORIZATION};

    let mut redacted = headers.clone();
    if redacted.contains_key(AUTHORIZATION) {
        redacted.insert(AUTHORIZATION, HeaderValue::from_static("<redacted>"));
    }
    redacted
}
