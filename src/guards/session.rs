use log::{error, warn};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};

use crate::models::AuthSession;
use crate::services::BackendHandle;
use crate::session::{CookieStorage, SessionStore};

/// The session for the browser making this request, restored from its private cookies.
pub type RequestSession<'r> = SessionStore<'r, CookieStorage<'r>>;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionStore<'r, CookieStorage<'r>> {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(backend) = req.rocket().state::<BackendHandle>() else {
            error!("Backend is not configured");
            return Outcome::Error((Status::InternalServerError, ()));
        };

        let storage = CookieStorage::new(req.cookies());
        Outcome::Success(SessionStore::restore(backend.auth(), storage).await)
    }
}

/// Signed in with the admin role.
pub struct AdminGuard<'r> {
    pub session: RequestSession<'r>,
    pub identity: AuthSession,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminGuard<'r> {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let session = match req.guard::<RequestSession<'r>>().await {
            Outcome::Success(session) => session,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        match session.identity() {
            Some(identity) if identity.profile.role.is_admin() => {
                Outcome::Success(AdminGuard { session, identity })
            }
            Some(identity) => {
                warn!("{} is not an admin", identity.profile.email);
                Outcome::Error((Status::Forbidden, ()))
            }
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
