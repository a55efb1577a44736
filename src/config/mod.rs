use rocket::figment::Figment;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_SIGNUP_CREDIT_GRANT: i64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown backend `{0}` (expected rest, hosted or memory)")]
    UnknownBackend(String),

    #[error("{0} must be set for the hosted backend")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Rest,
    Hosted,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "hosted" | "supabase" => Ok(BackendKind::Hosted),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Settings for the hosted (Supabase) backend.
#[derive(Debug, Clone)]
pub struct HostedSettings {
    pub url: String,
    pub anon_key: String,
    pub jwt_secret: Option<String>,
    pub admin_email: String,
    pub signup_credit_grant: i64,
}

pub struct Config;

impl Config {
    // Rocket.toml (profile-selected) merged with ROCKET_* environment variables.
    fn figment() -> Figment {
        rocket::Config::figment()
    }

    pub fn backend_kind() -> Result<BackendKind, ConfigError> {
        Self::figment()
            .extract_inner::<String>("backend")
            .map(|raw| raw.parse())
            .unwrap_or(Ok(BackendKind::Rest))
    }

    pub fn api_base_url() -> String {
        Self::figment()
            .extract_inner("api_base_url")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn supabase_url() -> Option<String> {
        Self::figment()
            .extract_inner("supabase_url")
            .ok()
    }

    pub fn supabase_anon_key() -> Option<String> {
        Self::figment()
            .extract_inner("supabase_anon_key")
            .ok()
    }

    pub fn supabase_jwt_secret() -> Option<String> {
        Self::figment()
            .extract_inner("supabase_jwt_secret")
            .ok()
    }

    pub fn admin_email() -> String {
        Self::figment()
            .extract_inner("admin_email")
            .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string())
    }

    pub fn signup_credit_grant() -> i64 {
        Self::figment()
            .extract_inner("signup_credit_grant")
            .unwrap_or(DEFAULT_SIGNUP_CREDIT_GRANT)
    }

    pub fn hosted() -> Result<HostedSettings, ConfigError> {
        let url = Self::supabase_url().ok_or(ConfigError::Missing("supabase_url"))?;
        let anon_key = Self::supabase_anon_key().ok_or(ConfigError::Missing("supabase_anon_key"))?;

        let signup_credit_grant = Self::signup_credit_grant();
        if signup_credit_grant < 0 {
            return Err(ConfigError::Invalid(
                "signup_credit_grant cannot be negative".to_string(),
            ));
        }

        Ok(HostedSettings {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            jwt_secret: Self::supabase_jwt_secret(),
            admin_email: Self::admin_email(),
            signup_credit_grant,
        })
    }
}
