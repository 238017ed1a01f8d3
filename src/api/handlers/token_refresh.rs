use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    cookie::extract_refresh_token,
    error::error_response,
    types::{AccessTokenResponse, ErrorResponse},
};
use crate::session::SessionProtocol;

#[utoipa::path(
    get,
    path = "/refresh",
    responses (
        (status = 200, description = "New access token", body = AccessTokenResponse, content_type = "application/json"),
        (status = 401, description = "No REFRESH_TOKEN cookie", body = ErrorResponse),
        (status = 403, description = "Refresh token unknown, superseded, expired or forged", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(headers: HeaderMap, protocol: Extension<Arc<SessionProtocol>>) -> Response {
    let token = extract_refresh_token(&headers);

    match protocol.refresh(token.as_deref()).await {
        Ok(access_token) => {
            (StatusCode::OK, Json(AccessTokenResponse { access_token })).into_response()
        }
        Err(err) => error_response(&err),
    }
}
