use rocket::request::FlashMessage;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};

use super::Page;
use crate::guards::RequestSession;
use crate::models::CreditTier;
use crate::utils::Toast;

#[get("/")]
pub fn index(session: RequestSession<'_>, flash: Option<FlashMessage<'_>>) -> Result<Template, Redirect> {
    let Some(identity) = session.identity() else {
        return Err(Redirect::to("/login"));
    };

    let profile = identity.profile;
    let tier = CreditTier::for_balance(profile.credits);
    Ok(Template::render(
        "home",
        context! {
            title: "Dashboard",
            is_admin: profile.role.is_admin(),
            tier: tier.label(),
            tier_class: tier.css_class(),
            show_onboarding: !session.has_seen_onboarding(),
            toast: Toast::from_flash(flash),
            user: profile,
        },
    ))
}

#[post("/onboarding/seen")]
pub fn onboarding_seen(session: RequestSession<'_>) -> Page {
    if !session.current().is_authenticated() {
        return Page::Redirect(Toast::error("Not signed in", "Please sign in first.").redirect("/login"));
    }
    session.mark_onboarding_seen();
    Page::Redirect(Toast::success("All set", "Welcome to the EcoWaste dashboard.").redirect("/"))
}
