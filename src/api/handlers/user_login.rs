use axum::{
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    cookie::refresh_cookie,
    error::{error_response, internal_error, rejected_payload},
    types::{AccessTokenResponse, ErrorResponse, UserLogin},
};
use crate::session::SessionProtocol;

#[utoipa::path(
    post,
    path = "/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful; refresh token set as REFRESH_TOKEN cookie", body = AccessTokenResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid payload, email not registered, or wrong password", body = ErrorResponse),
        (status = 500, description = "Credential store or signing failure", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(protocol, payload))]
pub async fn login(
    protocol: Extension<Arc<SessionProtocol>>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> Response {
    let Json(user) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload(&rejection),
    };

    let grant = match protocol.login(user.into()).await {
        Ok(grant) => grant,
        Err(err) => return error_response(&err),
    };

    let cookie = match refresh_cookie(protocol.config(), &grant.refresh_token) {
        Ok(cookie) => cookie,
        Err(e) => {
            debug!("Invalid refresh cookie value: {:?}", e);
            return internal_error("Error building refresh cookie");
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    (
        StatusCode::OK,
        headers,
        Json(AccessTokenResponse {
            access_token: grant.access_token,
        }),
    )
        .into_response()
}
