//! REST backend client.
//!
//! [`ApiClient::request`] normalizes every backend call into either an
//! [`ApiResponse`] or a tagged [`ApiError`]:
//!
//! 1. Non-2xx: message from the JSON body's `message`/`error` field, else the
//!    status line (`HTTP 500: Internal Server Error`); a non-JSON body is kept
//!    as the error payload.
//! 2. 204: [`ApiResponse::Empty`].
//! 3. JSON content-type: parsed body.
//! 4. Anything else: raw text.
//!
//! Transport failures become [`ApiError::Network`] so callers can tell an
//! unreachable server from one that answered with an error.

mod endpoints;
mod transport;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::API_BASE_URL;
use crate::error::{ApiError, ErrorPayload};

pub use transport::{FetchTransport, HttpRequest, HttpTransport, RawResponse};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;

/// HTTP verbs used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204 No Content.
    Empty,
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserialize a JSON body into `T`. `None` for empty or text bodies.
    pub fn into_typed<T: DeserializeOwned>(self) -> Option<Result<T, serde_json::Error>> {
        match self {
            ApiResponse::Json(value) => Some(serde_json::from_value(value)),
            _ => None,
        }
    }
}

/// Client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    base_url: String,
    transport: T,
}

impl ApiClient<FetchTransport> {
    /// Browser client against the configured backend.
    pub fn browser() -> Self {
        Self::new(API_BASE_URL, FetchTransport)
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request against `base_url + endpoint`.
    ///
    /// `headers` are merged over the default `Content-Type: application/json`;
    /// a caller-supplied header with the same name wins.
    pub async fn request(
        &self,
        method: Method,
        headers: &[(&str, &str)],
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = HttpRequest {
            method,
            url: url.clone(),
            headers: merge_headers(headers),
            body: body.map(Value::to_string),
        };

        log::debug!("{method} {url}");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| ApiError::Network {
                url: url.clone(),
                method,
                source,
            })?;

        interpret(response, url, method)
    }
}

fn merge_headers(headers: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut merged = vec![("Content-Type".to_string(), "application/json".to_string())];
    for (name, value) in headers {
        match merged.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.to_string(),
            None => merged.push((name.to_string(), value.to_string())),
        }
    }
    merged
}

fn interpret(response: RawResponse, url: String, method: Method) -> Result<ApiResponse, ApiError> {
    if !response.is_success() {
        return Err(http_error(response, url, method));
    }

    if response.status == 204 {
        return Ok(ApiResponse::Empty);
    }

    let body = response.body.clone().unwrap_or_default();
    if response.is_json() {
        return serde_json::from_str(&body)
            .map(ApiResponse::Json)
            .map_err(|source| ApiError::Decode {
                url,
                method,
                source,
            });
    }

    Ok(ApiResponse::Text(body))
}

fn http_error(response: RawResponse, url: String, method: Method) -> ApiError {
    let status_line = format!("HTTP {}: {}", response.status, response.status_text);

    let (message, payload) = match response.body {
        Some(body) => match serde_json::from_str::<Value>(&body) {
            Ok(json) => {
                let message = ["message", "error"]
                    .iter()
                    .find_map(|key| json.get(key).and_then(Value::as_str))
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| status_line.clone());
                (message, Some(ErrorPayload::Json(json)))
            }
            Err(_) if body.is_empty() => (status_line, None),
            Err(_) => (status_line, Some(ErrorPayload::Text(body))),
        },
        None => (status_line, None),
    };

    log::warn!("{method} {url} failed: {message}");
    ApiError::Http {
        status: response.status,
        status_text: response.status_text,
        message,
        url,
        method,
        payload,
    }
}
