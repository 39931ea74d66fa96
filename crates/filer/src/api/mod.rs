// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! REST clients for the platform's file APIs.
//!
//! Each API is a trait so backends can be driven either by the HTTP client
//! here or by the in-memory remote in [`crate::testing`].

pub mod dbfs;
pub mod files;
pub mod workspace;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure talking to a remote API, before it is mapped to a filer error
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Status {
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status<C: Into<String>, M: Into<String>>(status: u16, error_code: C, message: M) -> Self {
        ApiError::Status {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ApiError::Status { error_code, .. } => Some(error_code),
            _ => None,
        }
    }

    /// True if this is a status error with the given HTTP status and error code
    #[must_use]
    pub fn is(&self, status: u16, code: &str) -> bool {
        self.http_status() == Some(status) && self.error_code() == Some(code)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Body shape the platform uses for every error response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// Connection settings for a workspace
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(host: Url) -> Self {
        Self {
            host,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()?;
        Ok(ApiClient {
            http,
            host: self.host,
            token: self.token,
        })
    }
}

/// Authenticated HTTP client for one workspace.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    host: Url,
    token: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Build a URL for an API path. The path is percent-encoded as needed.
    fn url(&self, path: &str) -> Url {
        let mut url = self.host.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base, path));
        url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        log::debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, turning non-success statuses into [`ApiError::Status`]
    pub(crate) async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    pub(crate) async fn get_json<Q, T>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = self.send(request).await?;
        decode_json(response).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        let response = self.send(request).await?;
        decode_json(response).await
    }
}

/// Empty response body, as returned by most mutating endpoints
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Empty {}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let text = response.text().await?;
    let text = if text.trim().is_empty() { "{}" } else { &text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    parse_error_body(status, &text)
}

fn parse_error_body(status: StatusCode, text: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) if !body.message.is_empty() || !body.error_code.is_empty() => {
            let message = if body.message.is_empty() {
                body.error_code.clone()
            } else {
                body.message
            };
            ApiError::status(status.as_u16(), body.error_code, message)
        }
        _ => {
            let message = if text.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, text.trim())
            };
            ApiError::status(status.as_u16(), "", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_body() {
        let err = parse_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"error_code":"RESOURCE_ALREADY_EXISTS","message":"A file or directory already exists at the input path /a."}"#,
        );
        assert!(err.is(400, "RESOURCE_ALREADY_EXISTS"));
        assert_eq!(
            err.to_string(),
            "A file or directory already exists at the input path /a."
        );
    }

    #[test]
    fn test_parse_error_body_not_json() {
        let err = parse_error_body(StatusCode::BAD_GATEWAY, "upstream went away");
        assert_eq!(err.http_status(), Some(502));
        assert_eq!(err.error_code(), Some(""));
        assert!(err.to_string().contains("upstream went away"));
    }

    #[test]
    fn test_url_encodes_path() {
        let client = ClientConfig::new(Url::parse("https://example.com").unwrap())
            .build()
            .unwrap();
        let url = client.url("/api/2.0/fs/files/Volumes/a b/c#d");
        assert_eq!(
            url.as_str(),
            "https://example.com/api/2.0/fs/files/Volumes/a%20b/c%23d"
        );
    }
}
