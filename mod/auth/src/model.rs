use serde::{Deserialize, Serialize};

use desk_core::Role;

/// A login account — district staff, school account or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    /// School scope for SCHOOL accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_code: Option<String>,
    /// Argon2 PHC string. Kept in its own column and never serialized,
    /// so it can reach neither clients nor the JSON data blob.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_code: Option<String>,
}

/// JWT claims for a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_code: Option<String>,
    /// Session id, fresh per login.
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}
