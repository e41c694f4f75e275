use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use teaser_core::TeaserError;

use crate::analyzer::AnalyzeError;

/// Errors surfaced at the HTTP boundary as `{ "message": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error("{0}")]
    Render(#[from] TeaserError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Analyze(err) => match err {
                AnalyzeError::InvalidUrl => StatusCode::BAD_REQUEST,
                AnalyzeError::Unauthorized => StatusCode::UNAUTHORIZED,
                AnalyzeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                AnalyzeError::Unavailable | AnalyzeError::ScrapeFailed(_) => StatusCode::BAD_GATEWAY,
                AnalyzeError::MissingCredential | AnalyzeError::Other(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Render(TeaserError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Asset errors drop the path or URL they
    /// refer to; the full error only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Render(TeaserError::Asset { message, .. }) => format!("asset error: {}", message),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        let body = ErrorResponse {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AnalyzeError::ScrapeFailed("blocked".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(AnalyzeError::MissingCredential).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(TeaserError::Encode("ffmpeg exited".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_render_message_is_human_readable() {
        let err = ApiError::from(TeaserError::asset("image fetch failed with HTTP 404", "https://acme.test/og.png"));
        assert_eq!(err.public_message(), "asset error: image fetch failed with HTTP 404");
    }

    #[test]
    fn test_asset_path_stays_out_of_response() {
        let err = ApiError::from(TeaserError::asset("failed to read image file", "/srv/secret/og.png"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("/srv/secret"));
        assert!(err.to_string().contains("/srv/secret"));
    }

    #[test]
    fn test_invalid_render_argument_is_client_error() {
        let err = ApiError::from(TeaserError::InvalidArgument("hero image must be an http(s) URL".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
