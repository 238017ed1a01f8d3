use axum::response::IntoResponse;

// plain liveness, no dependencies checked
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
