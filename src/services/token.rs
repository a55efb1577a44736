use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims carried by a hosted-backend access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // auth user id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

pub struct TokenInspector;

impl TokenInspector {
    /// Read the claims of an access token.
    ///
    /// The signature is checked only when the project's JWT secret is known. Expiry is
    /// left to the caller, which refreshes instead of failing.
    pub fn claims(token: &str, secret: Option<&str>) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let key = match secret {
            Some(secret) => DecodingKey::from_secret(secret.as_bytes()),
            None => {
                validation.insecure_disable_signature_validation();
                DecodingKey::from_secret(&[])
            }
        };

        let token_data = decode::<Claims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }

    pub fn expires_at(token: &str, secret: Option<&str>) -> Result<i64, jsonwebtoken::errors::Error> {
        Self::claims(token, secret).map(|claims| claims.exp)
    }
}
