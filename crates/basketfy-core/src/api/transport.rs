//! HTTP transports.
//!
//! [`FetchTransport`] issues requests with the browser Fetch API via
//! `gloo-net`; [`MockTransport`] replays scripted responses in tests.

use gloo_net::http::{Headers, RequestBuilder};

use super::Method;
use crate::error::TransportError;

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Response as received, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    /// `None` when the body could not be read.
    pub body: Option<String>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Sends one request. No retries, no caching.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// Browser Fetch API transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl HttpTransport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let headers = Headers::new();
        for (name, value) in &request.headers {
            headers.set(name, value);
        }

        let builder = RequestBuilder::new(&request.url)
            .method(request.method.into())
            .headers(headers);

        let built = match request.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| TransportError(e.to_string()))?;

        let response = built
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let content_type = response.headers().get("content-type");
        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("failed to read body of {} {}: {e}", request.method, request.url);
                None
            }
        };

        Ok(RawResponse {
            status: response.status(),
            status_text: response.status_text(),
            content_type,
            body,
        })
    }
}

impl From<Method> for gloo_net::http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => gloo_net::http::Method::GET,
            Method::Post => gloo_net::http::Method::POST,
            Method::Put => gloo_net::http::Method::PUT,
            Method::Patch => gloo_net::http::Method::PATCH,
            Method::Delete => gloo_net::http::Method::DELETE,
        }
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replays queued responses and records every request it receives.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        responses: RefCell<VecDeque<Result<RawResponse, TransportError>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, status: u16, status_text: &str, content_type: Option<&str>, body: &str) {
            self.responses.borrow_mut().push_back(Ok(RawResponse {
                status,
                status_text: status_text.to_string(),
                content_type: content_type.map(str::to_string),
                body: Some(body.to_string()),
            }));
        }

        pub fn fail(&self, message: &str) {
            self.responses
                .borrow_mut()
                .push_back(Err(TransportError(message.to_string())));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("no scripted response".to_string())))
        }
    }
}
