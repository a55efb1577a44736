use log::{info, warn};
use rocket::State;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{Template, context};

use super::{Page, expired, load_failed};
use crate::guards::AdminGuard;
use crate::models::UserId;
use crate::services::BackendHandle;
use crate::utils::Toast;
use crate::views::{CreditGrant, CreditsView, ViewError};

#[derive(Debug, FromForm)]
pub struct AddCreditsForm {
    pub user_id: String,
    pub amount: String,
}

#[get("/credits")]
pub async fn index(
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    flash: Option<FlashMessage<'_>>,
) -> Page {
    let token = admin.identity.token.clone();
    let mut toast = Toast::from_flash(flash);

    let view = match CreditsView::load(backend.data(), token.clone()).await {
        Ok(view) => view,
        Err(ViewError::Gateway(e)) => match load_failed(&admin.session, &e).await {
            Ok(failed) => {
                toast = Some(failed);
                CreditsView::empty(backend.data(), token)
            }
            Err(redirect) => return redirect.into(),
        },
        Err(e) => {
            toast = Some(Toast::for_view_error("Error loading data", &e));
            CreditsView::empty(backend.data(), token)
        }
    };

    Template::render(
        "credits",
        context! {
            title: "Green Credits",
            active: "credits",
            user: &admin.identity.profile,
            page: view.page(),
            toast,
        },
    )
    .into()
}

#[post("/credits", data = "<form>")]
pub async fn add(
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    form: Form<AddCreditsForm>,
) -> Flash<Redirect> {
    const TITLE: &str = "Error adding credits";

    // Rejected amounts never reach the backend.
    let grant = match CreditGrant::parse(&form.amount) {
        Ok(grant) => grant,
        Err(e) => return Toast::for_view_error("Invalid amount", &e).redirect("/credits"),
    };
    let user_id = match form.user_id.parse::<UserId>() {
        Ok(id) => id,
        Err(message) => return Toast::error(TITLE, message).redirect("/credits"),
    };

    let mut view = match CreditsView::load(backend.data(), admin.identity.token.clone()).await {
        Ok(view) => view,
        Err(ViewError::Gateway(e)) if e.is_unauthorized() => return expired(&admin.session).await,
        Err(e) => return Toast::for_view_error(TITLE, &e).redirect("/credits"),
    };

    let (name, balance) = match view.add_credits(&user_id, grant).await {
        Ok(user) => (user.name.clone(), user.credits),
        Err(e) => return Toast::for_view_error(TITLE, &e).redirect("/credits"),
    };
    info!("Added {} credits to user {}", grant.amount(), user_id);

    // The signed-in admin's own cached balance follows the grant.
    if admin.identity.profile.id == user_id {
        if let Err(e) = admin.session.update_credits(balance).await {
            warn!("Could not update own balance: {}", e);
        }
    }

    Toast::success(
        "Credits added",
        format!("Added {} credits to {}.", grant.amount(), name),
    )
    .redirect("/credits")
}
