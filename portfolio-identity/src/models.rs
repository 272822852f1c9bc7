//! Wire DTOs for the identity service
//!
//! Property names follow the service's existing JSON contract.

use serde::{Deserialize, Serialize};

/// Credential exchange request (`POST /api/auth/login`)
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued by a successful credential exchange
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "tokenType", default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Account registration request (`POST /api/auth/register`)
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    #[serde(rename = "nomeCompleto")]
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "curso", skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(rename = "turno", skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
}

/// Profile update request (`PUT /api/users/me`)
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nomeCompleto")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "curso", skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(rename = "turno", skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
}

/// Password reset request (`POST /api/auth/forgot-password`)
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}
