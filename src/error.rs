use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors produced while selecting and calling backend hosts.
///
/// Per-host failures (`BackendTransport`, `BackendStatus`) are absorbed by
/// the dispatch loop and converted into a retry against the next untried
/// host; only the two exhaustion conditions reach the caller.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("no hosts registered")]
    NoHostsAvailable,

    #[error("all available hosts failed")]
    AllHostsExhausted,

    #[error("host {host} failed: {reason}")]
    BackendTransport { host: String, reason: String },

    #[error("host {host} returned error status {status}")]
    BackendStatus { host: String, status: u16 },
}

impl ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NoHostsAvailable | ProxyError::AllHostsExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProxyError::BackendTransport { .. } | ProxyError::BackendStatus { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
