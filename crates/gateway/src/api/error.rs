//! Translates domain errors to the `{error: {code, message}}` JSON contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pax_domain::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::ThreadNotFound(_) => (StatusCode::NOT_FOUND, "thread_not_found"),
            Error::ToolNotFound(_) => (StatusCode::NOT_FOUND, "tool_not_found"),
            Error::DuplicateTool(_) => (StatusCode::BAD_REQUEST, "duplicate_tool"),
            Error::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            Error::PlanningError(_) => (StatusCode::BAD_REQUEST, "planning_error"),
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config"),
            Error::Io(_) | Error::Json(_) | Error::Http(_) | Error::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            Error::ToolTimeout { .. } | Error::ToolFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "tool_error"),
        };

        (
            status,
            axum::Json(serde_json::json!({ "error": { "code": code, "message": self.0.to_string() } })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: Error) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn thread_not_found_is_404() {
        assert_eq!(status_of(Error::ThreadNotFound("t".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_tool_is_400() {
        assert_eq!(status_of(Error::DuplicateTool("echo".into())), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_error_is_500() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(status_of(Error::Io(io_err)), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
