use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futfan_core::ExchangeError;
use tracing::error;

/// Errors a handler can return.
///
/// Upstream failures are logged with their cause; the client only sees the
/// route's generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        source: ExchangeError,
    },
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn upstream(message: &'static str) -> impl FnOnce(ExchangeError) -> Self {
        move |source| Self::Upstream { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream { message, source } => {
                error!(error = %source, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": message })),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
