//! Maps session failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, error};

use super::types::ErrorResponse;
use crate::session::{ErrorKind, SessionError};

/// HTTP status for each failure.
///
/// A taken email answers 404 and login failures answer 400; clients already
/// depend on those codes.
#[must_use]
pub fn status_for(err: &SessionError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Auth => match err {
            SessionError::MissingRefreshToken => StatusCode::UNAUTHORIZED,
            SessionError::UnknownRefreshToken | SessionError::InvalidRefreshToken(_) => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::BAD_REQUEST,
        },
    }
}

/// Turn a session error into `{ code, message }` with the matching status.
pub fn error_response(err: &SessionError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Request failed: {err}");
    } else {
        debug!("Request rejected: {err}");
    }

    let body = ErrorResponse {
        code: err.code().to_string(),
        message: err.to_string(),
    };

    (status, Json(body)).into_response()
}

fn json_error(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorResponse {
        code: code.to_string(),
        message,
    };
    (status, Json(body)).into_response()
}

/// Response for a request without a usable body.
fn missing_payload() -> Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "missing_payload",
        "Missing payload".to_string(),
    )
}

/// Every JSON extraction failure answers 400 with a `{ code, message }` body.
///
/// A request without a JSON content type is treated as having no payload;
/// unparsable or wrongly typed bodies are `invalid_payload`.
pub fn rejected_payload(rejection: &JsonRejection) -> Response {
    debug!("Rejected payload: {rejection}");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => missing_payload(),
        _ => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_payload",
            rejection.body_text(),
        ),
    }
}

/// 500 for failures outside the session protocol, such as building a header.
pub fn internal_error(message: &str) -> Response {
    error!("Request failed: {message}");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        message.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TokenError;
    use crate::store::StoreError;
    use anyhow::Result;
    use axum::body::to_bytes;

    #[test]
    fn statuses_follow_contract() {
        assert_eq!(
            status_for(&SessionError::MissingField("email")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SessionError::PasswordMismatch),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&SessionError::EmailTaken), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&SessionError::EmailNotRegistered),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SessionError::WrongPassword),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SessionError::MissingRefreshToken),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&SessionError::UnknownRefreshToken),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&SessionError::InvalidRefreshToken(TokenError::Expired)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&SessionError::Store(StoreError::Unavailable(
                "down".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_body_carries_code_and_message() -> Result<()> {
        let response = error_response(&SessionError::EmailTaken);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["code"], "email_taken");
        assert_eq!(value["message"], "Email already registered");
        Ok(())
    }

    #[tokio::test]
    async fn internal_errors_expose_underlying_message() -> Result<()> {
        let err = SessionError::Store(StoreError::Unavailable("pool timed out".to_string()));
        let response = error_response(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["code"], "internal");
        assert_eq!(value["message"], "store unavailable: pool timed out");
        Ok(())
    }

    #[tokio::test]
    async fn internal_error_uses_json_body() -> Result<()> {
        let response = internal_error("Error building refresh cookie");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["code"], "internal");
        assert_eq!(value["message"], "Error building refresh cookie");
        Ok(())
    }
}
