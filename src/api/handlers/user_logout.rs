use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{
    cookie::{clear_refresh_cookie, extract_refresh_token},
    error::error_response,
    types::ErrorResponse,
};
use crate::session::{LogoutOutcome, SessionProtocol};

#[utoipa::path(
    post,
    path = "/logout",
    responses (
        (status = 200, description = "Session cleared"),
        (status = 204, description = "Nothing to clear"),
        (status = 500, description = "Credential store failure", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, protocol: Extension<Arc<SessionProtocol>>) -> Response {
    let token = extract_refresh_token(&headers);

    match protocol.logout(token.as_deref()).await {
        Ok(LogoutOutcome::Cleared) => {
            let mut response_headers = HeaderMap::new();
            match clear_refresh_cookie(protocol.config()) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(e) => error!("Error building expired refresh cookie: {:?}", e),
            }
            (StatusCode::OK, response_headers).into_response()
        }
        Ok(LogoutOutcome::NothingToClear) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
