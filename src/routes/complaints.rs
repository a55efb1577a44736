use rocket::State;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{Template, context};

use super::{Page, expired, load_failed};
use crate::guards::AdminGuard;
use crate::services::BackendHandle;
use crate::utils::Toast;
use crate::views::{ComplaintsView, ViewError};

#[derive(Debug, FromForm)]
pub struct AssignForm {
    pub worker_id: Option<i64>,
}

#[get("/complaints")]
pub async fn index(
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    flash: Option<FlashMessage<'_>>,
) -> Page {
    let token = admin.identity.token.clone();
    let mut toast = Toast::from_flash(flash);

    let view = match ComplaintsView::load(backend.data(), token.clone()).await {
        Ok(view) => view,
        Err(ViewError::Gateway(e)) => match load_failed(&admin.session, &e).await {
            Ok(failed) => {
                toast = Some(failed);
                ComplaintsView::empty(backend.data(), token)
            }
            Err(redirect) => return redirect.into(),
        },
        Err(e) => {
            toast = Some(Toast::for_view_error("Error loading data", &e));
            ComplaintsView::empty(backend.data(), token)
        }
    };

    Template::render(
        "complaints",
        context! {
            title: "Waste Complaints",
            active: "complaints",
            user: &admin.identity.profile,
            page: view.page(),
            toast,
        },
    )
    .into()
}

async fn load_for_action<'a>(
    admin: &AdminGuard<'_>,
    backend: &'a BackendHandle,
    title: &str,
) -> Result<ComplaintsView<'a>, Flash<Redirect>> {
    match ComplaintsView::load(backend.data(), admin.identity.token.clone()).await {
        Ok(view) => Ok(view),
        Err(ViewError::Gateway(e)) if e.is_unauthorized() => Err(expired(&admin.session).await),
        Err(e) => Err(Toast::for_view_error(title, &e).redirect("/complaints")),
    }
}

#[post("/complaints/<id>/assign", data = "<form>")]
pub async fn assign(
    id: i64,
    admin: AdminGuard<'_>,
    backend: &State<BackendHandle>,
    form: Form<AssignForm>,
) -> Flash<Redirect> {
    const TITLE: &str = "Error assigning worker";

    let mut view = match load_for_action(&admin, backend, TITLE).await {
        Ok(view) => view,
        Err(redirect) => return redirect,
    };

    match view.assign_worker(id, form.worker_id).await {
        Ok(complaint) => {
            let worker = complaint
                .assigned_worker
                .as_ref()
                .map(|w| w.name.as_str())
                .unwrap_or("A worker");
            Toast::success(
                "Worker assigned",
                format!("{} has been assigned to complaint #{}.", worker, complaint.id),
            )
            .redirect("/complaints")
        }
        Err(e) => Toast::for_view_error(TITLE, &e).redirect("/complaints"),
    }
}

#[post("/complaints/<id>/complete")]
pub async fn complete(id: i64, admin: AdminGuard<'_>, backend: &State<BackendHandle>) -> Flash<Redirect> {
    const TITLE: &str = "Error updating status";

    let mut view = match load_for_action(&admin, backend, TITLE).await {
        Ok(view) => view,
        Err(redirect) => return redirect,
    };

    match view.mark_complete(id).await {
        Ok(complaint) => Toast::success(
            "Complaint completed",
            format!("Complaint #{} has been marked as completed.", complaint.id),
        )
        .redirect("/complaints"),
        Err(e) => Toast::for_view_error(TITLE, &e).redirect("/complaints"),
    }
}
