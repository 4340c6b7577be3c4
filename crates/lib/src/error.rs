//! Per-request failures and their HTTP mapping.
//!
//! Every variant ends the request; nothing is retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid JSON")]
    MalformedRequest,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Downstream(String),
    #[error("Not found")]
    NotFound,
}

impl BridgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::Unauthorized => StatusCode::FORBIDDEN,
            BridgeError::MalformedRequest | BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
