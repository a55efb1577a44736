use std::sync::Arc;

use ecowaste_admin::services::MemoryBackend;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "demo";

pub async fn client_with(backend: Arc<MemoryBackend>) -> Client {
    Client::tracked(ecowaste_admin::build(backend))
        .await
        .expect("valid rocket instance")
}

/// Seeded demo data plus a client wired to it.
pub async fn seeded() -> (Client, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::seeded(ADMIN_EMAIL, 100));
    (client_with(backend.clone()).await, backend)
}

pub async fn post_form(client: &Client, uri: &str, body: &str) -> (Status, Option<String>) {
    let response = client
        .post(uri.to_string())
        .header(ContentType::Form)
        .body(body.to_string())
        .dispatch()
        .await;
    let location = response.headers().get_one("Location").map(str::to_string);
    (response.status(), location)
}

pub async fn login(client: &Client, email: &str) {
    let body = format!("email={}&password={}", email.replace('@', "%40"), PASSWORD);
    let (status, location) = post_form(client, "/login", &body).await;
    assert_eq!(status, Status::SeeOther, "login as {email} should redirect");
    assert_eq!(location.as_deref(), Some("/"));
}

pub async fn get_page(client: &Client, uri: &str) -> (Status, String) {
    let response = client.get(uri.to_string()).dispatch().await;
    let status = response.status();
    (status, response.into_string().await.unwrap_or_default())
}
