use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{ApiClientError, Query, Result};

/// One logical call: method, endpoint, headers, optional JSON body and query.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) endpoint: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) query: Query,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: Vec::new(),
            body: None,
            query: Query::default(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn head(endpoint: impl Into<String>) -> Self {
        Self::new(Method::HEAD, endpoint)
    }

    /// Adds a header. Caller headers override the client defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the query parameters, replacing any previous ones.
    pub fn query(mut self, query: impl Into<Query>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets an already-built JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiClientError::Encode(format!("request body: {err}")))?;
        Ok(self.body(value))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// JSON text sent on the wire. GET and HEAD never carry a body, and a
    /// `null` body is treated as absent.
    pub(crate) fn body_text(&self) -> Option<String> {
        if self.method == Method::GET || self.method == Method::HEAD {
            return None;
        }
        match &self.body {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(value.to_string()),
        }
    }

    /// Builds the outgoing headers.
    ///
    /// Order of precedence, lowest first: `Content-Type: application/json`,
    /// the bearer authorization, caller headers.
    pub(crate) fn header_map(&self, authorization: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(authorization) = authorization {
            let value = HeaderValue::from_str(authorization).map_err(|_| {
                ApiClientError::InvalidHeader(
                    "authorization token is not a valid header value".to_owned(),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiClientError::InvalidHeader(format!("name '{name}': {err}")))?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                ApiClientError::InvalidHeader(format!("value for '{name}': {err}"))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}
