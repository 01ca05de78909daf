use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cardfolio::market_data::{EnrichError, ListingsError};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<EnrichError> for ApiError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::MissingWallet => {
                ApiError::new(StatusCode::BAD_REQUEST, "Wallet address is required")
            }
            EnrichError::Inventory(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<ListingsError> for ApiError {
    fn from(err: ListingsError) -> Self {
        let message = match &err {
            ListingsError::NotConfigured => "Database configuration is incomplete".to_string(),
            ListingsError::Query(_) => err.to_string(),
        };
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}
