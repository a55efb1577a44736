use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use log::info;

use super::{AuthBackend, DataGateway, GatewayError, GatewayResult, provisioned_role};
use crate::models::{
    AuthSession, AuthStateChange, AuthToken, Complaint, ComplaintStatus, Profile, RedeemCode,
    Report, ReportStatus, Role, SignupOutcome, UserId, Worker,
};

const TOKEN_PREFIX: &str = "memory-token-";

struct Account {
    profile: Profile,
    password: String,
}

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    complaints: Vec<Complaint>,
    workers: Vec<Worker>,
    reports: Vec<Report>,
    redeem_codes: Vec<RedeemCode>,
    next_user_id: i64,
}

impl Tables {
    fn account_for_token(&self, token: &AuthToken) -> Option<&Account> {
        let id = token.access_token.strip_prefix(TOKEN_PREFIX)?;
        self.accounts
            .iter()
            .find(|account| account.profile.id.to_string() == id)
    }
}

/// In-process backend for local development and tests.
///
/// Behaves like the REST API: ids are numeric, tokens are opaque and every call succeeds
/// or fails as a whole. [`MemoryBackend::set_available`] simulates an outage.
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    available: AtomicBool,
    gateway_calls: AtomicUsize,
    admin_email: String,
    signup_credit_grant: i64,
}

impl MemoryBackend {
    pub fn new(admin_email: impl Into<String>, signup_credit_grant: i64) -> Self {
        MemoryBackend {
            tables: Mutex::new(Tables {
                next_user_id: 1,
                ..Tables::default()
            }),
            available: AtomicBool::new(true),
            gateway_calls: AtomicUsize::new(0),
            admin_email: admin_email.into(),
            signup_credit_grant,
        }
    }

    /// Demo accounts (password `demo`), workers, complaints, reports and redeem codes.
    pub fn seeded(admin_email: impl Into<String>, signup_credit_grant: i64) -> Self {
        let admin_email = admin_email.into();
        let backend = Self::new(admin_email.clone(), signup_credit_grant);

        let john = backend.insert_account("John Doe", "john@example.com", "demo", Role::User, 120);
        let jane = backend.insert_account("Jane Smith", "jane@example.com", "demo", Role::User, 45);
        backend.insert_account("Admin User", &admin_email, "demo", Role::Admin, 0);

        for (id, name, phone, area) in [
            (1, "Ravi Kumar", "555-0101", "North Zone"),
            (2, "Maria Lopez", "555-0102", "Central Market"),
            (3, "Sam Okafor", "555-0103", "Riverside"),
        ] {
            backend.insert_worker(Worker {
                id,
                name: name.to_string(),
                phone: phone.to_string(),
                area: area.to_string(),
            });
        }

        let now = Utc::now();
        backend.insert_complaint(Complaint {
            id: 1,
            user_id: john.id.clone(),
            name: john.name.clone(),
            location: "12 Park Road".to_string(),
            description: "Overflowing public bin next to the bus stop.".to_string(),
            photo: None,
            status: ComplaintStatus::Pending,
            assigned_worker: None,
            created_at: now - Duration::hours(5),
            updated_at: now - Duration::hours(5),
        });
        backend.insert_complaint(Complaint {
            id: 2,
            user_id: jane.id.clone(),
            name: jane.name.clone(),
            location: "Central Market, stall 14".to_string(),
            description: "Plastic waste dumped behind the market.".to_string(),
            photo: None,
            status: ComplaintStatus::Assigned,
            assigned_worker: backend.worker(2),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::hours(20),
        });

        backend.insert_report(Report {
            id: 1,
            user_id: jane.id.clone(),
            complaint_id: 2,
            description: "Worker arrived late and left bags behind.".to_string(),
            status: ReportStatus::Pending,
            created_at: now - Duration::hours(2),
        });

        backend.insert_redeem_code(RedeemCode {
            id: 1,
            code: "ECO-7Q2X-91".to_string(),
            user_id: john.id,
            created_at: now - Duration::days(3),
            redeemed: false,
        });

        info!("Seeded in-memory backend with demo data");
        backend
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        credits: i64,
    ) -> Profile {
        let mut tables = self.tables();
        let profile = Profile {
            id: UserId::Numeric(tables.next_user_id),
            name: name.to_string(),
            email: email.to_string(),
            role,
            credits,
        };
        tables.next_user_id += 1;
        tables.accounts.push(Account {
            profile: profile.clone(),
            password: password.to_string(),
        });
        profile
    }

    pub fn insert_worker(&self, worker: Worker) {
        self.tables().workers.push(worker);
    }

    pub fn insert_complaint(&self, complaint: Complaint) {
        self.tables().complaints.push(complaint);
    }

    pub fn insert_report(&self, report: Report) {
        self.tables().reports.push(report);
    }

    pub fn insert_redeem_code(&self, code: RedeemCode) {
        self.tables().redeem_codes.push(code);
    }

    pub fn worker(&self, id: i64) -> Option<Worker> {
        self.tables().workers.iter().find(|w| w.id == id).cloned()
    }

    pub fn complaint(&self, id: i64) -> Option<Complaint> {
        self.tables().complaints.iter().find(|c| c.id == id).cloned()
    }

    pub fn report(&self, id: i64) -> Option<Report> {
        self.tables().reports.iter().find(|r| r.id == id).cloned()
    }

    pub fn profile(&self, id: &UserId) -> Option<Profile> {
        self.tables()
            .accounts
            .iter()
            .find(|a| &a.profile.id == id)
            .map(|a| a.profile.clone())
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of data requests served so far.
    pub fn gateway_calls(&self) -> usize {
        self.gateway_calls.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> GatewayResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GatewayError::Unavailable)
        }
    }

    /// Gate for data requests: the service must be up and the token must name an account.
    fn authorize(&self, token: &AuthToken) -> GatewayResult<MutexGuard<'_, Tables>> {
        self.gateway_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        let tables = self.tables();
        if tables.account_for_token(token).is_none() {
            return Err(GatewayError::Status(401));
        }
        Ok(tables)
    }

    fn session_for(profile: &Profile) -> AuthSession {
        AuthSession {
            profile: profile.clone(),
            token: AuthToken::bearer(format!("{}{}", TOKEN_PREFIX, profile.id)),
        }
    }
}

#[rocket::async_trait]
impl AuthBackend for MemoryBackend {
    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthSession> {
        self.ensure_available()?;
        let tables = self.tables();
        tables
            .accounts
            .iter()
            .find(|a| a.profile.email.eq_ignore_ascii_case(email.trim()) && a.password == password)
            .map(|a| Self::session_for(&a.profile))
            .ok_or_else(|| GatewayError::Rejected("Invalid email or password".to_string()))
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> GatewayResult<SignupOutcome> {
        self.ensure_available()?;
        let exists = self
            .tables()
            .accounts
            .iter()
            .any(|a| a.profile.email.eq_ignore_ascii_case(email.trim()));
        if exists {
            return Err(GatewayError::Rejected("User already registered".to_string()));
        }

        let profile = self.insert_account(
            name.trim(),
            email.trim(),
            password,
            provisioned_role(email, &self.admin_email),
            self.signup_credit_grant,
        );
        Ok(SignupOutcome::SignedIn(Self::session_for(&profile)))
    }

    async fn logout(&self, _token: &AuthToken) -> GatewayResult<()> {
        Ok(())
    }

    async fn persist_credits(&self, session: &AuthSession, credits: i64) -> GatewayResult<()> {
        self.ensure_available()?;
        let mut tables = self.tables();
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.profile.id == session.profile.id)
            .ok_or_else(|| GatewayError::Rejected("User not found".to_string()))?;
        account.profile.credits = credits;
        Ok(())
    }

    async fn resume(&self, stored: AuthSession) -> GatewayResult<AuthStateChange> {
        self.ensure_available()?;
        let tables = self.tables();
        Ok(match tables.account_for_token(&stored.token) {
            Some(account) => AuthStateChange::SignedIn(AuthSession {
                profile: account.profile.clone(),
                token: stored.token,
            }),
            None => AuthStateChange::SignedOut,
        })
    }

    fn supports_signup(&self) -> bool {
        true
    }
}

#[rocket::async_trait]
impl DataGateway for MemoryBackend {
    async fn list_complaints(&self, token: &AuthToken) -> GatewayResult<Vec<Complaint>> {
        Ok(self.authorize(token)?.complaints.clone())
    }

    async fn list_workers(&self, token: &AuthToken) -> GatewayResult<Vec<Worker>> {
        Ok(self.authorize(token)?.workers.clone())
    }

    async fn list_users(&self, token: &AuthToken) -> GatewayResult<Vec<Profile>> {
        Ok(self
            .authorize(token)?
            .accounts
            .iter()
            .map(|a| a.profile.clone())
            .collect())
    }

    async fn list_reports(&self, token: &AuthToken) -> GatewayResult<Vec<Report>> {
        Ok(self.authorize(token)?.reports.clone())
    }

    async fn list_redeem_codes(&self, token: &AuthToken) -> GatewayResult<Vec<RedeemCode>> {
        Ok(self.authorize(token)?.redeem_codes.clone())
    }

    async fn assign_worker(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        worker_id: i64,
    ) -> GatewayResult<Complaint> {
        let mut tables = self.authorize(token)?;
        let worker = tables
            .workers
            .iter()
            .find(|w| w.id == worker_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected("Worker not found".to_string()))?;
        let complaint = tables
            .complaints
            .iter_mut()
            .find(|c| c.id == complaint_id)
            .ok_or_else(|| GatewayError::Rejected("Complaint not found".to_string()))?;

        if complaint.status != ComplaintStatus::Pending {
            return Err(GatewayError::Rejected("Complaint is not pending".to_string()));
        }

        complaint.status = ComplaintStatus::Assigned;
        complaint.assigned_worker = Some(worker);
        complaint.updated_at = Utc::now();
        Ok(complaint.clone())
    }

    async fn set_complaint_status(
        &self,
        token: &AuthToken,
        complaint_id: i64,
        status: ComplaintStatus,
    ) -> GatewayResult<Complaint> {
        let mut tables = self.authorize(token)?;
        let complaint = tables
            .complaints
            .iter_mut()
            .find(|c| c.id == complaint_id)
            .ok_or_else(|| GatewayError::Rejected("Complaint not found".to_string()))?;

        complaint.status = status;
        complaint.updated_at = Utc::now();
        Ok(complaint.clone())
    }

    async fn set_report_status(
        &self,
        token: &AuthToken,
        report_id: i64,
        status: ReportStatus,
    ) -> GatewayResult<Option<Report>> {
        let mut tables = self.authorize(token)?;
        let report = tables
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| GatewayError::Rejected("Report not found".to_string()))?;

        report.status = status;
        Ok(Some(report.clone()))
    }

    async fn add_credits(
        &self,
        token: &AuthToken,
        user_id: &UserId,
        amount: i64,
    ) -> GatewayResult<()> {
        let mut tables = self.authorize(token)?;
        if amount <= 0 {
            return Err(GatewayError::Rejected("Credits must be positive".to_string()));
        }

        let account = tables
            .accounts
            .iter_mut()
            .find(|a| &a.profile.id == user_id)
            .ok_or_else(|| GatewayError::Rejected("User not found".to_string()))?;
        account.profile.credits = account
            .profile
            .credits
            .checked_add(amount)
            .ok_or_else(|| GatewayError::Rejected("Credit balance is too large".to_string()))?;
        Ok(())
    }
}
