use serde::{Deserialize, Serialize};

use super::Profile;

/// Credentials presented to the backend on every call made for a session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthToken {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        AuthToken {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn expires_within(&self, now: i64, leeway: i64) -> bool {
        self.expires_at.map(|exp| exp - leeway <= now).unwrap_or(false)
    }
}

/// An authenticated identity: who is signed in and how to talk to the backend for them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthSession {
    pub profile: Profile,
    pub token: AuthToken,
}

/// Push-style auth state notifications, as emitted by the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStateChange {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    SignedIn(AuthSession),
    /// Account created; the backend wants the address confirmed before the first sign-in.
    ConfirmationRequired,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
