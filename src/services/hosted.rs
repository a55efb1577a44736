use chrono::Utc;
use log::{info, warn};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{AuthBackend, DataGateway, GatewayError, GatewayResult, TokenInspector, provisioned_role};
use crate::config::HostedSettings;
use crate::models::{
    AuthSession, AuthStateChange, AuthToken, Complaint, ComplaintStatus, LoginRequest, Profile,
    RedeemCode, Report, ReportStatus, SignupOutcome, UserId, Worker,
};

/// Refresh tokens this close to expiry instead of using them.
const REFRESH_LEEWAY_SECS: i64 = 60;
const COMPLAINT_SELECT: &str = "select=*,assigned_worker:workers(*)";

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn token(&self) -> AuthToken {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        AuthToken {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreditsRow {
    credits: i64,
}

/// Pull a human readable message out of an auth or PostgREST error body.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Display name for a new profile when the account carries none.
fn display_name(user: &AuthUser, fallback: Option<&str>) -> String {
    fallback
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.trim().to_string())
        .or_else(|| {
            user.user_metadata
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| {
            user.email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "EcoWaste user".to_string())
}

/// Supabase-backed auth and data.
pub struct HostedBackend {
    client: Client,
    settings: HostedSettings,
}

impl HostedBackend {
    pub fn new(settings: HostedSettings) -> Self {
        HostedBackend {
            client: Client::new(),
            settings,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.settings.url, path)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.settings.url, path)
    }

    fn request(&self, method: Method, url: String, token: Option<&AuthToken>) -> RequestBuilder {
        let bearer = token
            .map(|t| t.access_token.as_str())
            .unwrap_or(self.settings.anon_key.as_str());
        self.client
            .request(method, url)
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(bearer)
    }

    async fn read_json(res: Response) -> GatewayResult<Value> {
        Self::read_json_as(res, |code| matches!(code, 400 | 409 | 422)).await
    }

    /// `verbatim` picks the failing statuses whose body message reaches the user as-is.
    async fn read_json_as(res: Response, verbatim: fn(u16) -> bool) -> GatewayResult<Value> {
        let status = res.status();
        let body = res.text().await?;
        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?
        };

        if status.is_success() {
            return Ok(value);
        }

        warn!("Hosted backend responded {}: {}", status, body);
        match (status.as_u16(), error_message(&value)) {
            (code, Some(message)) if verbatim(code) => Err(GatewayError::Rejected(message)),
            (code, _) => Err(GatewayError::Status(code)),
        }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str, token: &AuthToken) -> GatewayResult<Vec<T>> {
        let res = self
            .request(Method::GET, self.rest_url(path), Some(token))
            .send()
            .await?;
        let value = Self::read_json(res).await?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn update_one<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AuthToken,
        body: Value,
        missing: &str,
    ) -> GatewayResult<T> {
        let res = self
            .request(Method::PATCH, self.rest_url(path), Some(token))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<T> = serde_json::from_value(Self::read_json(res).await?)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::Rejected(missing.to_string()))
    }

    async fn grant(&self, grant_type: &str, body: Value) -> GatewayResult<TokenResponse> {
        let url = self.auth_url(&format!("token?grant_type={}", grant_type));
        let res = self.request(Method::POST, url, None).json(&body).send().await?;
        serde_json::from_value(Self::read_json(res).await?)
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn fetch_profile(&self, id: &UserId, token: &AuthToken) -> GatewayResult<Option<Profile>> {
        let rows: Vec<Profile> = self
            .select(&format!("profiles?id=eq.{}&select=*", id), token)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Load the profile for a signed-in account, creating it on first sign-in.
    async fn provision_profile(
        &self,
        user: &AuthUser,
        token: &AuthToken,
        name: Option<&str>,
    ) -> GatewayResult<Profile> {
        let id = UserId::Uuid(user.id);
        if let Some(profile) = self.fetch_profile(&id, token).await? {
            return Ok(profile);
        }

        let email = user.email.clone().unwrap_or_default();
        let profile = Profile {
            id,
            name: display_name(user, name),
            role: provisioned_role(&email, &self.settings.admin_email),
            email,
            credits: self.settings.signup_credit_grant,
        };

        let res = self
            .request(Method::POST, self.rest_url("profiles"), Some(token))
            .header("Prefer", "return=representation")
            .json(&profile)
            .send()
            .await?;
        let rows: Vec<Profile> = serde_json::from_value(Self::read_json(res).await?)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        info!("Provisioned profile for {} as {:?}", profile.email, profile.role);
        Ok(rows.into_iter().next().unwrap_or(profile))
    }

    async fn sign_in(&self, response: TokenResponse, name: Option<&str>) -> GatewayResult<AuthSession> {
        let token = response.token();
        let profile = self.provision_profile(&response.user, &token, name).await?;
        Ok(AuthSession { profile, token })
    }

    /// Make sure the stored token is still usable, refreshing it when it is about to lapse.
    /// `Ok(None)` means the session is gone.
    async fn fresh_token(&self, mut token: AuthToken) -> GatewayResult<Option<(AuthToken, bool)>> {
        match TokenInspector::expires_at(&token.access_token, self.settings.jwt_secret.as_deref()) {
            Ok(exp) => token.expires_at = Some(exp),
            Err(e) => {
                warn!("Discarding stored session token: {}", e);
                return Ok(None);
            }
        }

        if !token.expires_within(Utc::now().timestamp(), REFRESH_LEEWAY_SECS) {
            return Ok(Some((token, false)));
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            return Ok(None);
        };

        match self
            .grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(response) => Ok(Some((response.token(), true))),
            Err(GatewayError::Rejected(_) | GatewayError::Status(400 | 401)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[rocket::async_trait]
impl AuthBackend for HostedBackend {
    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthSession> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let response = self.grant("password", body).await?;
        self.sign_in(response, None).await
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> GatewayResult<SignupOutcome> {
        let res = self
            .request(Method::POST, self.auth_url("signup"), None)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name }
            }))
            .send()
            .await?;
        // Every signup failure carries a message meant for the person signing up.
        let value = Self::read_json_as(res, |_| true).await?;

        // Without auto-confirm the backend answers with the bare user and no session.
        if value.get("access_token").is_none() {
            return Ok(SignupOutcome::ConfirmationRequired);
        }

        let response: TokenResponse =
            serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))?;
        let session = self.sign_in(response, Some(name)).await?;
        Ok(SignupOutcome::SignedIn(session))
    }

    async fn logout(&self, token: &AuthToken) -> GatewayResult<()> {
        let res = self
            .request(Method::POST, self.auth_url("logout"), Some(token))
            .send()
            .await?;
        Self::read_json(res).await.map(|_| ())
    }

    async fn persist_credits(&self, session: &AuthSession, credits: i64) -> GatewayResult<()> {
        let path = format!("profiles?id=eq.{}", session.profile.id);
        let _: Profile = self
            .update_one(&path, &session.token, json!({ "credits": credits }), "Profile not found")
            .await?;
        Ok(())
    }

    async fn resume(&self, stored: AuthSession) -> GatewayResult<AuthStateChange> {
        let Some((token, refreshed)) = self.fresh_token(stored.token).await? else {
            return Ok(AuthStateChange::SignedOut);
        };

        let profile = match self.fetch_profile(&stored.profile.id, &token).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Ok(AuthStateChange::SignedOut),
            Err(e) if e.is_unauthorized() => return Ok(AuthStateChange::SignedOut),
            Err(e) => return Err(e),
        };

        let session = AuthSession { profile, token };
        Ok(if refreshed {
            AuthStateChange::TokenRefreshed(session)
        } else {
            AuthStateChange::SignedIn(session)
        })
    }

    fn supports_signup(&self) -> bool {
        true
    }
}

#[rocket::async_trait]
impl DataGateway for HostedBackend {
    async fn list_complaints(&self, token: &AuthToken) -> GatewayResult<Vec<Complaint>> {
        self.select(&format!("complaints?{}&order=created_at.desc", COMPLAINT_SELECT), token)
            .await
    }

    async fn list_workers(&self, token: &AuthToken) -> GatewayResult<Vec<Worker>> {
        self.select("workers?select=*&order=name.asc", token).await
    }

    async fn list_users(&self, token: &AuthToken) -> GatewayResult<Vec<Profile>> {
        self.select("profiles?select=*&order=name.asc", token).await
    }

    async fn list_reports(&self, token: &AuthToken) -> GatewayResult<Vec<Report>> {
        self.select("reports?select=*&order=created_at.desc", token).await
    }

    async fn list_redeem_codes(&self, token: &AuthToken) -> GatewayResult<Vec<RedeemCode>> {
        self.select("redeem_codes?select=*&order=created_at.desc", token).await
    }

    async fn assign_worker(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        worker_id: i64,
    ) -> GatewayResult<Complaint> {
        let path = format!("complaints?id=eq.{}&{}", complaint_id, COMPLAINT_SELECT);
        let body = json!({
            "assigned_worker_id": worker_id,
            "status": ComplaintStatus::Assigned,
            "updated_at": Utc::now(),
        });
        self.update_one(&path, token, body, "Complaint not found").await
    }

    async fn set_complaint_status(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        status: ComplaintStatus,
    ) -> GatewayResult<Complaint> {
        let path = format!("complaints?id=eq.{}&{}", complaint_id, COMPLAINT_SELECT);
        let body = json!({ "status": status, "updated_at": Utc::now() });
        self.update_one(&path, token, body, "Complaint not found").await
    }

    async fn set_report_status(
        &self,
        token: &AuthToken,
        report_id: i64,
        status: ReportStatus,
    ) -> GatewayResult<Option<Report>> {
        let path = format!("reports?id=eq.{}", report_id);
        self.update_one(&path, token, json!({ "status": status }), "Report not found")
            .await
            .map(Some)
    }

    // PostgREST has no increment; read the balance and write the sum.
    async fn add_credits(
        &self,
        token: &AuthToken,
        user_id: &UserId,
        amount: i64,
    ) -> GatewayResult<()> {
        let rows: Vec<CreditsRow> = self
            .select(&format!("profiles?id=eq.{}&select=credits", user_id), token)
            .await?;
        let current = rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Rejected("User not found".to_string()))?;
        let credits = current
            .credits
            .checked_add(amount)
            .ok_or_else(|| GatewayError::Rejected("Credit balance is too large".to_string()))?;

        let path = format!("profiles?id=eq.{}", user_id);
        let _: Profile = self
            .update_one(
                &path,
                token,
                json!({ "credits": credits }),
                "User not found",
            )
            .await?;
        Ok(())
    }
}
