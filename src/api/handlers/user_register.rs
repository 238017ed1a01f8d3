use axum::{
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    error::{error_response, rejected_payload},
    types::{ErrorResponse, MessageResponse, UserRegister},
};
use crate::session::SessionProtocol;

#[utoipa::path(
    post,
    path = "/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Account created", body = MessageResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid payload, empty field, invalid email or password mismatch", body = ErrorResponse),
        (status = 404, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Credential store or hashing failure", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(protocol, payload))]
pub async fn register(
    protocol: Extension<Arc<SessionProtocol>>,
    payload: Result<Json<UserRegister>, JsonRejection>,
) -> Response {
    let Json(user) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload(&rejection),
    };

    match protocol.register(user.into()).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "Account created".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
