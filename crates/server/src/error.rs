use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::store::StoreError;
use services::services::user_resolver::ResolveError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required parameter or body field is absent or malformed.
    #[error("{0}")]
    MissingInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "request failed");
        (
            status,
            Json(ApiResponse::<serde_json::Value>::error(self.to_string())),
        )
            .into_response()
    }
}
