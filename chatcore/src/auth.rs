//! Wire shapes of the identity service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::UserId;

#[derive(Debug, Clone, Serialize)]
pub struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpMetadata {
    pub username: String,
}

impl<'a> SignUpRequest<'a> {
    /// The initial username is the local part of the email address.
    pub fn new(email: &'a str, password: &'a str) -> Self {
        let username = email.split('@').next().unwrap_or(email).to_string();
        Self {
            email,
            password,
            data: SignUpMetadata { username },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

impl Session {
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    /// The account exists but must be confirmed by email before signing in.
    ConfirmationRequired,
}

impl SignUpOutcome {
    pub fn from_response(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("access_token").is_some() {
            Ok(Self::SignedIn(serde_json::from_value(value)?))
        } else {
            Ok(Self::ConfirmationRequired)
        }
    }
}
