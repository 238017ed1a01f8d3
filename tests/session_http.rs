//! End-to-end session flows through the HTTP router with the in-memory store.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use sesi::{
    api,
    session::{SessionConfig, SessionProtocol, TokenIssuer},
    store::MemoryCredentialStore,
};
use std::sync::Arc;
use tower::ServiceExt;

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "s3cret!";

fn app() -> Result<Router> {
    let tokens = TokenIssuer::new(
        &SecretString::from("access-secret"),
        &SecretString::from("refresh-secret"),
    )?;
    let protocol = Arc::new(SessionProtocol::new(
        Arc::new(MemoryCredentialStore::new()),
        tokens,
        SessionConfig::new().with_cookie_secure(false),
    ));
    let cors = api::cors_layer(&["http://localhost:8080".to_string()])?;
    Ok(api::app(protocol, cors))
}

fn json_request(method: &str, uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

fn cookie_request(method: &str, uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("REFRESH_TOKEN={token}"));
    }
    Ok(builder.body(Body::empty())?)
}

async fn send(app: &Router, request: Request<Body>) -> Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

async fn body_json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn registration(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "phoneNumber": "0812345678",
        "email": email,
        "password": PASSWORD,
        "confirmPassword": PASSWORD,
    })
}

async fn register(app: &Router) -> Result<()> {
    let response = send(app, json_request("POST", "/register", &registration(EMAIL))?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

/// Log in and return `(access_token, refresh_token)`.
async fn login(app: &Router) -> Result<(String, String)> {
    let body = json!({ "email": EMAIL, "password": PASSWORD });
    let response = send(app, json_request("POST", "/login", &body)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("login response has no Set-Cookie")?
        .to_str()?
        .to_string();
    let refresh = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("REFRESH_TOKEN="))
        .context("Set-Cookie does not carry REFRESH_TOKEN")?
        .to_string();

    let body = body_json(response).await?;
    let access = body["accessToken"]
        .as_str()
        .context("missing accessToken")?
        .to_string();
    Ok((access, refresh))
}

#[tokio::test]
async fn register_then_duplicate_is_not_found() -> Result<()> {
    let app = app()?;
    let response = send(&app, json_request("POST", "/register", &registration(EMAIL))?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await?["message"], "Account created");

    let response = send(&app, json_request("POST", "/register", &registration(EMAIL))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await?["code"], "email_taken");
    Ok(())
}

#[tokio::test]
async fn register_validation_errors_are_bad_request() -> Result<()> {
    let app = app()?;

    let mut body = registration(EMAIL);
    body["confirmPassword"] = json!("different");
    let response = send(&app, json_request("POST", "/register", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "password_mismatch");

    let mut body = registration(EMAIL);
    body["phoneNumber"] = json!("");
    let response = send(&app, json_request("POST", "/register", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "missing_field");
    Ok(())
}

#[tokio::test]
async fn missing_body_is_bad_request() -> Result<()> {
    let app = app()?;
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .body(Body::empty())?;
    let response = send(&app, request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "missing_payload");
    Ok(())
}

#[tokio::test]
async fn wrongly_typed_field_is_bad_request() -> Result<()> {
    let app = app()?;

    let mut body = registration(EMAIL);
    body["email"] = json!(42);
    let response = send(&app, json_request("POST", "/register", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await?;
    assert_eq!(error["code"], "invalid_payload");
    assert!(error["message"].as_str().is_some_and(|m| !m.is_empty()));

    let body = json!({ "email": EMAIL, "password": true });
    let response = send(&app, json_request("POST", "/login", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "invalid_payload");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = app()?;
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))?;
    let response = send(&app, request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "invalid_payload");
    Ok(())
}

#[tokio::test]
async fn numeric_phone_number_is_accepted() -> Result<()> {
    let app = app()?;
    let mut body = registration(EMAIL);
    body["phoneNumber"] = json!(812_345_678);
    let response = send(&app, json_request("POST", "/register", &body)?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn login_failures_are_bad_request() -> Result<()> {
    let app = app()?;
    register(&app).await?;

    let body = json!({ "email": "nobody@example.com", "password": PASSWORD });
    let response = send(&app, json_request("POST", "/login", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "email_not_registered");

    let body = json!({ "email": EMAIL, "password": "wrong" });
    let response = send(&app, json_request("POST", "/login", &body)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "wrong_password");
    Ok(())
}

#[tokio::test]
async fn login_sets_refresh_cookie() -> Result<()> {
    let app = app()?;
    register(&app).await?;

    let body = json!({ "email": EMAIL, "password": PASSWORD });
    let response = send(&app, json_request("POST", "/login", &body)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    assert!(cookie.starts_with("REFRESH_TOKEN="));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn refresh_issues_new_access_token() -> Result<()> {
    let app = app()?;
    register(&app).await?;
    let (access, refresh) = login(&app).await?;

    let response = send(&app, cookie_request("GET", "/refresh", Some(&refresh))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = body_json(response).await?;
    let renewed = renewed["accessToken"].as_str().context("missing accessToken")?;
    assert!(!renewed.is_empty());
    assert_ne!(renewed, access);
    Ok(())
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() -> Result<()> {
    let app = app()?;
    let response = send(&app, cookie_request("GET", "/refresh", None)?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_with_unknown_token_is_forbidden() -> Result<()> {
    let app = app()?;
    let response = send(&app, cookie_request("GET", "/refresh", Some("forged"))?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn second_login_revokes_first_refresh_token() -> Result<()> {
    let app = app()?;
    register(&app).await?;
    let (_, first) = login(&app).await?;
    let (_, second) = login(&app).await?;
    assert_ne!(first, second);

    let response = send(&app, cookie_request("GET", "/refresh", Some(&first))?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, cookie_request("GET", "/refresh", Some(&second))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_once() -> Result<()> {
    let app = app()?;
    register(&app).await?;
    let (_, refresh) = login(&app).await?;

    let response = send(&app, cookie_request("POST", "/logout", Some(&refresh))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    assert!(cookie.contains("Max-Age=0"));

    let response = send(&app, cookie_request("POST", "/logout", Some(&refresh))?).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, cookie_request("POST", "/logout", None)?).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, cookie_request("GET", "/refresh", Some(&refresh))?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let app = app()?;

    let response = send(&app, cookie_request("GET", "/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await?["database"], "ok");

    let response = send(&app, cookie_request("OPTIONS", "/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, cookie_request("GET", "/", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
