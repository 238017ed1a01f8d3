//! Request/response bodies for the session endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::session::{LoginForm, RegisterForm};

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRegister {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Accepted as a JSON string or number; stored as text.
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

impl From<UserRegister> for RegisterForm {
    fn from(user: UserRegister) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email: user.email,
            password: user.password,
            confirm_password: user.confirm_password,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UserLogin {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<UserLogin> for LoginForm {
    fn from(user: UserLogin) -> Self {
        Self {
            email: user.email,
            password: user.password,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    /// Stable machine-readable error code.
    pub code: String,
    pub message: String,
}
