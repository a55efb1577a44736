pub mod auth;
pub mod complaints;
pub mod credits;
pub mod home;
pub mod reports;

use rocket::Request;
use rocket::response::{Flash, Redirect};
use rocket::{Catcher, Route};
use rocket_dyn_templates::{Template, context};

use crate::guards::RequestSession;
use crate::services::GatewayError;
use crate::utils::Toast;

/// A page either renders or sends the browser elsewhere.
#[derive(Responder)]
pub enum Page {
    Render(Template),
    Redirect(Flash<Redirect>),
}

impl From<Template> for Page {
    fn from(template: Template) -> Self {
        Page::Render(template)
    }
}

impl From<Flash<Redirect>> for Page {
    fn from(redirect: Flash<Redirect>) -> Self {
        Page::Redirect(redirect)
    }
}

/// The backend no longer accepts the stored token: sign out and start over.
pub(crate) async fn expired(session: &RequestSession<'_>) -> Flash<Redirect> {
    session.logout().await;
    Toast::error("Session expired", "Please sign in again.").redirect("/login")
}

/// What a failed load turns into: a fresh login on 401, otherwise an empty page with a toast.
pub(crate) async fn load_failed(
    session: &RequestSession<'_>,
    err: &GatewayError,
) -> Result<Toast, Flash<Redirect>> {
    if err.is_unauthorized() {
        return Err(expired(session).await);
    }
    Ok(Toast::for_gateway_error("Error loading data", err))
}

pub fn routes() -> Vec<Route> {
    routes![
        auth::login_page,
        auth::login,
        auth::signup_page,
        auth::signup,
        auth::logout,
        home::index,
        home::onboarding_seen,
        complaints::index,
        complaints::assign,
        complaints::complete,
        reports::index,
        reports::set_status,
        credits::index,
        credits::add,
    ]
}

#[catch(401)]
fn unauthorized() -> Redirect {
    Redirect::to("/login")
}

#[catch(403)]
fn forbidden() -> Template {
    Template::render(
        "forbidden",
        context! {
            title: "Admin access required",
            message: "You need an administrator account to view this page.",
        },
    )
}

#[catch(404)]
fn not_found(req: &Request) -> Template {
    Template::render(
        "error",
        context! {
            title: "Page not found",
            message: format!("Nothing lives at {}.", req.uri().path()),
        },
    )
}

#[catch(500)]
fn internal_error() -> Template {
    Template::render(
        "error",
        context! {
            title: "Something went wrong",
            message: crate::utils::TRY_AGAIN,
        },
    )
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden, not_found, internal_error]
}
