//! JSON API routes used by page scripts.

pub mod location;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Error body for JSON endpoints.
#[derive(Debug, Serialize)]
pub struct JsonError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl JsonError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            error: msg.into(),
        }
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
