use rocket::State;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{Template, context};

use super::{Page, expired, load_failed};
use crate::guards::AdminGuard;
use crate::models::ReportStatus;
use crate::services::BackendHandle;
use crate::utils::Toast;
use crate::views::{ReportsView, ViewError};

#[derive(Debug, FromForm)]
pub struct StatusForm {
    pub status: String,
}

#[get("/reports")]
pub async fn index(
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    flash: Option<FlashMessage<'_>>,
) -> Page {
    let token = admin.identity.token.clone();
    let mut toast = Toast::from_flash(flash);

    let view = match ReportsView::load(backend.data(), token.clone()).await {
        Ok(view) => view,
        Err(ViewError::Gateway(e)) => match load_failed(&admin.session, &e).await {
            Ok(failed) => {
                toast = Some(failed);
                ReportsView::empty(backend.data(), token)
            }
            Err(redirect) => return redirect.into(),
        },
        Err(e) => {
            toast = Some(Toast::for_view_error("Error loading data", &e));
            ReportsView::empty(backend.data(), token)
        }
    };

    Template::render(
        "reports",
        context! {
            title: "Worker Reports",
            active: "reports",
            user: &admin.identity.profile,
            page: view.page(),
            toast,
        },
    )
    .into()
}

#[post("/reports/<id>/status", data = "<form>")]
pub async fn set_status(
    id: i64,
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    form: Form<StatusForm>,
) -> Flash<Redirect> {
    const TITLE: &str = "Error updating status";

    let status = match form.status.parse::<ReportStatus>() {
        Ok(status) => status,
        Err(message) => return Toast::error(TITLE, message).redirect("/reports"),
    };

    let mut view = match ReportsView::load(backend.data(), admin.identity.token.clone()).await {
        Ok(view) => view,
        Err(ViewError::Gateway(e)) if e.is_unauthorized() => return expired(&admin.session).await,
        Err(e) => return Toast::for_view_error(TITLE, &e).redirect("/reports"),
    };

    match view.set_status(id, status).await {
        Ok(report) => Toast::success(
            "Report updated",
            format!("Report #{} marked as {}.", report.id, report.status.label().to_lowercase()),
        )
        .redirect("/reports"),
        Err(e) => Toast::for_view_error(TITLE, &e).redirect("/reports"),
    }
}
