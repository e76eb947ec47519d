//! `apiclient-http` is an async REST client with a bounded retry protocol.
//!
//! Every call goes through [`ApiClient::request`]:
//! - each attempt is cut off after [`ClientConfig::timeout_ms`]
//! - failed attempts (timeouts, connection errors, non-2xx) are retried up to
//!   [`ClientConfig::max_retries`] attempts with a fixed delay in between
//! - bodies are returned as JSON when they parse, raw text otherwise
//! - terminal failures carry status and diagnostics in [`ApiError`]

mod client;
mod config;
mod decode;
mod endpoint;
mod error;
mod payload;
mod query;
mod request;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use endpoint::build_url;
pub use error::{ApiClientError, ApiError, ErrorDetails};
pub use payload::Payload;
pub use query::{Query, QueryValue};
pub use request::ApiRequest;
pub use reqwest::{header::HeaderMap, Method};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, ApiClientError>;
