use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use vps_control::ControlError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Control(e) => e.code(),
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

// Extractor rejections keep their parser detail out of the response body.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "expected an application/json body",
            JsonRejection::JsonSyntaxError(_) => "malformed JSON body",
            JsonRejection::JsonDataError(_) => "request body has missing or invalid fields",
            _ => "invalid request body",
        };
        ApiError::BadRequest(message.into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected path parameters");
        ApiError::BadRequest("invalid path parameter".into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        ApiError::BadRequest("invalid query parameters".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Control(ControlError::NotFound | ControlError::ActionNotFound) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Control(ControlError::AccessDenied) => StatusCode::FORBIDDEN,
            ApiError::Control(ControlError::ActionNotAllowed(_)) => StatusCode::CONFLICT,
            ApiError::Control(ControlError::RateLimitExceeded { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Control(ControlError::UpstreamUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        let retry_after = match &self {
            ApiError::Control(ControlError::RateLimitExceeded { retry_after_secs }) => {
                body["retry_after_seconds"] = (*retry_after_secs).into();
                Some(*retry_after_secs)
            }
            _ => None,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
