pub mod hosted;
pub mod memory;
pub mod rest;
pub mod token;

pub use hosted::HostedBackend;
pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use token::TokenInspector;

use std::sync::Arc;

use log::{error, info};
use rocket::fairing::AdHoc;
use thiserror::Error;

use crate::config::{BackendKind, Config, ConfigError};
use crate::models::{
    AuthSession, AuthStateChange, AuthToken, Complaint, ComplaintStatus, Profile, RedeemCode,
    Report, ReportStatus, Role, SignupOutcome, UserId, Worker,
};

/// Failure of a single backend round trip. Callers show all of these the same way.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend responded with status {0}")]
    Status(u16),

    /// The backend refused the operation and said why.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    #[error("backend unavailable")]
    Unavailable,
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Status(401))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[rocket::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthSession>;

    async fn signup(&self, email: &str, password: &str, name: &str)
    -> GatewayResult<SignupOutcome>;

    async fn logout(&self, token: &AuthToken) -> GatewayResult<()>;

    /// Store a new balance for the signed-in user.
    async fn persist_credits(&self, session: &AuthSession, credits: i64) -> GatewayResult<()>;

    /// Decide what a previously stored session is worth now.
    async fn resume(&self, stored: AuthSession) -> GatewayResult<AuthStateChange>;

    fn supports_signup(&self) -> bool {
        false
    }
}

#[rocket::async_trait]
pub trait DataGateway: Send + Sync {
    async fn list_complaints(&self, token: &AuthToken) -> GatewayResult<Vec<Complaint>>;

    async fn list_workers(&self, token: &AuthToken) -> GatewayResult<Vec<Worker>>;

    async fn list_users(&self, token: &AuthToken) -> GatewayResult<Vec<Profile>>;

    async fn list_reports(&self, token: &AuthToken) -> GatewayResult<Vec<Report>>;

    async fn list_redeem_codes(&self, token: &AuthToken) -> GatewayResult<Vec<RedeemCode>>;

    async fn assign_worker(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        worker_id: i64,
    ) -> GatewayResult<Complaint>;

    async fn set_complaint_status(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        status: ComplaintStatus,
    ) -> GatewayResult<Complaint>;

    /// `None` when the backend confirmed the write without echoing the record.
    async fn set_report_status(
        &self,
        token: &AuthToken,
        report_id: i64,
        status: ReportStatus,
    ) -> GatewayResult<Option<Report>>;

    async fn add_credits(&self, token: &AuthToken, user_id: &UserId, amount: i64)
    -> GatewayResult<()>;
}

pub trait Backend: Send + Sync {
    fn auth(&self) -> &dyn AuthBackend;
    fn data(&self) -> &dyn DataGateway;
}

impl<T: AuthBackend + DataGateway + 'static> Backend for T {
    fn auth(&self) -> &dyn AuthBackend {
        self
    }

    fn data(&self) -> &dyn DataGateway {
        self
    }
}

/// Managed state: the one backend every request talks to.
#[derive(Clone)]
pub struct BackendHandle(Arc<dyn Backend>);

impl BackendHandle {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        BackendHandle(backend)
    }

    pub fn auth(&self) -> &dyn AuthBackend {
        self.0.auth()
    }

    pub fn data(&self) -> &dyn DataGateway {
        self.0.data()
    }
}

/// Role given to a freshly provisioned profile.
pub fn provisioned_role(email: &str, admin_email: &str) -> Role {
    if email.trim().eq_ignore_ascii_case(admin_email.trim()) {
        Role::Admin
    } else {
        Role::User
    }
}

pub fn from_config() -> Result<Arc<dyn Backend>, ConfigError> {
    let backend: Arc<dyn Backend> = match Config::backend_kind()? {
        BackendKind::Rest => Arc::new(RestBackend::new(Config::api_base_url())),
        BackendKind::Hosted => Arc::new(HostedBackend::new(Config::hosted()?)),
        BackendKind::Memory => Arc::new(MemoryBackend::seeded(
            Config::admin_email(),
            Config::signup_credit_grant(),
        )),
    };
    Ok(backend)
}

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("Backend", |rocket| async {
        match from_config() {
            Ok(backend) => {
                info!("✓ Backend configured ({:?})", Config::backend_kind().ok());
                Ok(rocket.manage(BackendHandle::new(backend)))
            }
            Err(e) => {
                error!("✗ Failed to configure backend: {}", e);
                Err(rocket)
            }
        }
    })
}
