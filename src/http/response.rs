//! Response handling.
//!
//! # Responsibilities
//! - Relay upstream responses without their hop-by-hop headers
//! - Map forwarding failures to gateway error statuses
//!
//! # Design Decisions
//! - Connection and protocol errors are 502, response timeouts are 504
//! - Error bodies are short plain text; details go to the log

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use std::error::Error;
use std::time::Duration;

use crate::http::request::remove_hop_by_hop;

/// Why a request could not be forwarded.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("{}", with_sources(.0))]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Render `error` followed by each of its causes, separated by `: `.
fn with_sources(error: &dyn Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Request(_) | ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Upstream request failed",
        };
        (status, body).into_response()
    }
}

/// Turn an upstream response into one we can send to the client.
pub fn relay(response: axum::http::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    remove_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_504() {
        let err = ForwardError::Timeout(Duration::from_secs(30));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("client error (Connect)")]
    struct Wrapper(#[source] std::io::Error);

    #[test]
    fn test_error_text_includes_causes() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(with_sources(&Wrapper(refused)), "client error (Connect): connection refused");
        assert_eq!(with_sources(&std::io::Error::other("plain")), "plain");
    }

    #[tokio::test]
    async fn test_upstream_error_names_the_cause() {
        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build_http::<Body>();
        let request = axum::http::Request::get("http://127.0.0.1:1/").body(Body::empty()).unwrap();

        let err = ForwardError::from(client.request(request).await.unwrap_err());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let message = err.to_string();
        assert!(message.starts_with("client error"), "{}", message);
        assert!(message.contains("tcp connect error"), "{}", message);
    }

    #[test]
    fn test_bad_request_maps_to_502() {
        let http_err = axum::http::Request::builder()
            .header("bad header", "x")
            .body(())
            .unwrap_err();
        let err = ForwardError::from(http_err);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
