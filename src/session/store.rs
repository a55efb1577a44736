use log::{info, warn};
use tokio::sync::watch;

use super::SessionStorage;
use crate::models::{AuthSession, AuthStateChange, AuthToken, Profile, SignupOutcome};
use crate::services::{AuthBackend, GatewayError, GatewayResult};

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";
pub const ONBOARDING_KEY: &str = "seen_onboarding";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated(AuthSession),
}

impl Session {
    pub fn identity(&self) -> Option<&AuthSession> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Unauthenticated => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.identity().map(|identity| &identity.profile)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// Who is signed in for one browser session.
///
/// Built per request from the configured auth backend and the browser's session storage.
/// Every state change is persisted to storage and published to subscribers.
pub struct SessionStore<'a, S: SessionStorage> {
    auth: &'a dyn AuthBackend,
    storage: S,
    state: watch::Sender<Session>,
}

impl<'a, S: SessionStorage> SessionStore<'a, S> {
    pub fn new(auth: &'a dyn AuthBackend, storage: S) -> Self {
        let (state, _) = watch::channel(Session::Unauthenticated);
        SessionStore {
            auth,
            storage,
            state,
        }
    }

    /// Rebuild the session from storage and let the backend say what it is worth.
    pub async fn restore(auth: &'a dyn AuthBackend, storage: S) -> Self {
        let store = Self::new(auth, storage);
        let Some(stored) = store.read_stored() else {
            return store;
        };

        match auth.resume(stored).await {
            Ok(change) => store.apply(change),
            // Keep what is stored; the next request gets another chance.
            Err(e) => warn!("Could not verify stored session: {}", e),
        }
        store
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<AuthSession> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.auth.login(email.trim(), password).await {
            Ok(session) => {
                info!("Signed in {}", session.profile.email);
                self.apply(AuthStateChange::SignedIn(session));
                true
            }
            Err(e) => {
                warn!("Login error: {}", e);
                false
            }
        }
    }

    pub async fn signup(&self, email: &str, password: &str, name: &str) -> GatewayResult<SignupOutcome> {
        let outcome = self.auth.signup(email.trim(), password, name.trim()).await?;
        if let SignupOutcome::SignedIn(session) = &outcome {
            info!("Signed up {}", session.profile.email);
            self.apply(AuthStateChange::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    pub async fn logout(&self) {
        if let Some(identity) = self.identity() {
            if let Err(e) = self.auth.logout(&identity.token).await {
                warn!("Backend logout failed for {}: {}", identity.profile.email, e);
            }
            info!("Signed out {}", identity.profile.email);
        }

        self.forget_identity();
        self.storage.remove(ONBOARDING_KEY);
    }

    /// Record a new balance for the signed-in user.
    ///
    /// With the REST backend the balance is only merged into the session; nothing confirms
    /// it was stored server-side.
    pub async fn update_credits(&self, credits: i64) -> GatewayResult<()> {
        let Some(mut identity) = self.identity() else {
            return Ok(());
        };
        if credits < 0 {
            return Err(GatewayError::Rejected(
                "Credit balance cannot be negative".to_string(),
            ));
        }

        self.auth.persist_credits(&identity, credits).await?;
        identity.profile.credits = credits;
        self.apply(AuthStateChange::SignedIn(identity));
        Ok(())
    }

    pub fn has_seen_onboarding(&self) -> bool {
        self.storage.get(ONBOARDING_KEY).as_deref() == Some("true")
    }

    pub fn mark_onboarding_seen(&self) {
        self.storage.set(ONBOARDING_KEY, "true".to_string());
    }

    fn apply(&self, change: AuthStateChange) {
        match change {
            AuthStateChange::SignedIn(session) | AuthStateChange::TokenRefreshed(session) => {
                self.persist(&session);
                self.state.send_replace(Session::Authenticated(session));
            }
            AuthStateChange::SignedOut => {
                info!("Stored session is no longer valid");
                self.forget_identity();
            }
        }
    }

    fn persist(&self, session: &AuthSession) {
        let profile = serde_json::to_string(&session.profile);
        let token = serde_json::to_string(&session.token);
        match (profile, token) {
            (Ok(profile), Ok(token)) => {
                self.storage.set(USER_KEY, profile);
                self.storage.set(TOKEN_KEY, token);
            }
            (Err(e), _) | (_, Err(e)) => warn!("Could not persist session: {}", e),
        }
    }

    fn read_stored(&self) -> Option<AuthSession> {
        let profile = self.storage.get(USER_KEY)?;
        let token = self.storage.get(TOKEN_KEY)?;

        let profile = serde_json::from_str::<Profile>(&profile);
        let token = serde_json::from_str::<AuthToken>(&token);
        match (profile, token) {
            (Ok(profile), Ok(token)) => Some(AuthSession { profile, token }),
            _ => {
                warn!("Discarding unreadable stored session");
                self.forget_identity();
                None
            }
        }
    }

    fn forget_identity(&self) {
        self.storage.remove(USER_KEY);
        self.storage.remove(TOKEN_KEY);
        self.state.send_replace(Session::Unauthenticated);
    }
}
