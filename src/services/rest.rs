use log::warn;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::{AuthBackend, DataGateway, GatewayError, GatewayResult};
use crate::models::{
    AuthSession, AuthStateChange, AuthToken, Complaint, ComplaintStatus, LoginRequest, Profile,
    RedeemCode, Report, ReportStatus, SignupOutcome, UserId, Worker,
};

/// `{ "success": bool, "message"?: string, <entity>?: object }` as returned by mutating endpoints.
#[derive(Debug)]
pub struct Envelope {
    pub success: bool,
    pub message: Option<String>,
    fields: Map<String, Value>,
}

impl Envelope {
    pub fn parse(value: Value) -> GatewayResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(GatewayError::Decode("expected a JSON object".to_string()));
        };

        let success = fields
            .remove("success")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| GatewayError::Decode("missing `success` flag".to_string()))?;
        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string));

        Ok(Envelope {
            success,
            message,
            fields,
        })
    }

    /// Fail unless the backend reported success.
    pub fn ensure_success(self, fallback: &str) -> GatewayResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(GatewayError::Rejected(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }

    pub fn take<T: DeserializeOwned>(&mut self, key: &str) -> GatewayResult<T> {
        let value = self
            .fields
            .remove(key)
            .ok_or_else(|| GatewayError::Decode(format!("missing `{}` in response", key)))?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Like [`Envelope::take`], but an absent or null entity is not an error.
    pub fn take_optional<T: DeserializeOwned>(&mut self, key: &str) -> GatewayResult<Option<T>> {
        match self.fields.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| GatewayError::Decode(e.to_string())),
        }
    }
}

/// Client for the EcoWaste REST API.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        RestBackend {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) if !token.access_token.is_empty() => builder.bearer_auth(&token.access_token),
            _ => builder,
        }
    }

    async fn read_json(path: &str, res: Response) -> GatewayResult<Value> {
        let status = res.status();
        if !status.is_success() {
            warn!("REST {} failed with status {}", path, status);
            return Err(GatewayError::Status(status.as_u16()));
        }

        res.json::<Value>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, token: &AuthToken) -> GatewayResult<T> {
        let res = self.request(Method::GET, path, Some(token)).send().await?;
        let value = Self::read_json(path, res).await?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
        body: Value,
    ) -> GatewayResult<Envelope> {
        let res = self.request(method, path, token).json(&body).send().await?;
        let value = Self::read_json(path, res).await?;
        Envelope::parse(value)
    }
}

#[rocket::async_trait]
impl AuthBackend for RestBackend {
    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthSession> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let mut envelope = self
            .mutate(Method::POST, "auth/login", None, body)
            .await?
            .ensure_success("Invalid email or password")?;

        let profile: Profile = envelope.take("user")?;
        let token: String = envelope.take("token")?;

        Ok(AuthSession {
            profile,
            token: AuthToken::bearer(token),
        })
    }

    async fn signup(
        &self,
        _email: &str,
        _password: &str,
        _name: &str,
    ) -> GatewayResult<SignupOutcome> {
        Err(GatewayError::Unsupported("signup"))
    }

    async fn logout(&self, _token: &AuthToken) -> GatewayResult<()> {
        Ok(())
    }

    // The REST API has no endpoint for the signed-in user's own balance; the new value only
    // lives in the session until the next login.
    async fn persist_credits(&self, _session: &AuthSession, _credits: i64) -> GatewayResult<()> {
        Ok(())
    }

    // A stored identity + token pair is taken at face value.
    async fn resume(&self, stored: AuthSession) -> GatewayResult<AuthStateChange> {
        Ok(AuthStateChange::SignedIn(stored))
    }
}

#[rocket::async_trait]
impl DataGateway for RestBackend {
    async fn list_complaints(&self, token: &AuthToken) -> GatewayResult<Vec<Complaint>> {
        self.fetch("complaints?role=admin", token).await
    }

    async fn list_workers(&self, token: &AuthToken) -> GatewayResult<Vec<Worker>> {
        self.fetch("workers", token).await
    }

    async fn list_users(&self, token: &AuthToken) -> GatewayResult<Vec<Profile>> {
        self.fetch("users", token).await
    }

    async fn list_reports(&self, token: &AuthToken) -> GatewayResult<Vec<Report>> {
        self.fetch("reports", token).await
    }

    async fn list_redeem_codes(&self, token: &AuthToken) -> GatewayResult<Vec<RedeemCode>> {
        self.fetch("redeem-codes", token).await
    }

    async fn assign_worker(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        worker_id: i64,
    ) -> GatewayResult<Complaint> {
        let path = format!("complaints/{}/assign", complaint_id);
        self.mutate(Method::PUT, &path, Some(token), json!({ "workerId": worker_id }))
            .await?
            .ensure_success("Failed to assign worker")?
            .take("complaint")
    }

    async fn set_complaint_status(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        status: ComplaintStatus,
    ) -> GatewayResult<Complaint> {
        let path = format!("complaints/{}/status", complaint_id);
        self.mutate(Method::PUT, &path, Some(token), json!({ "status": status }))
            .await?
            .ensure_success("Failed to update complaint")?
            .take("complaint")
    }

    async fn set_report_status(
        &self,
        token: &AuthToken,
        report_id: i64,
        status: ReportStatus,
    ) -> GatewayResult<Option<Report>> {
        let path = format!("reports/{}/status", report_id);
        self.mutate(Method::PUT, &path, Some(token), json!({ "status": status }))
            .await?
            .ensure_success("Failed to update report")?
            .take_optional("report")
    }

    async fn add_credits(
        &self,
        token: &AuthToken,
        user_id: &UserId,
        amount: i64,
    ) -> GatewayResult<()> {
        let path = format!("users/{}/credits", user_id);
        self.mutate(Method::POST, &path, Some(token), json!({ "credits": amount }))
            .await?
            .ensure_success("Failed to add credits")?;
        Ok(())
    }
}
