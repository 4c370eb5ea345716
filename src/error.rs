use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Admin access required")]
    NotAuthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NotAuthenticated",
            Self::NotAuthorized => "NotAuthorized",
            Self::NotFound(_) => "NotFound",
            Self::ValidationFailed(_) => "ValidationFailed",
            Self::Store(_) => "StoreError",
        }
    }
}

/// Malformed or mistyped request bodies are input errors like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(status = %rejection.status(), "rejected request body");
        Self::ValidationFailed(rejection.body_text())
    }
}

/// JSON body sent for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Store(e) => {
                tracing::error!(error = ?e, "store error");
                "Something went wrong on our end. Please try again later.".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AppError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotAuthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Food").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::validation("food_name is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn store_error_hides_details() {
        let res = AppError::Store(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("StoreError"));
        assert!(!text.contains("connection refused"));
    }

    #[test]
    fn not_found_names_the_resource() {
        assert_eq!(AppError::NotFound("Food").to_string(), "Food not found");
    }
}
