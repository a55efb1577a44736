mod support;

use std::sync::Arc;

use ecowaste_admin::models::{ComplaintStatus, RedeemCode, ReportStatus, Role, UserId};
use ecowaste_admin::services::MemoryBackend;
use rocket::http::Status;

use support::{ADMIN_EMAIL, client_with, get_page, login, post_form, seeded};

#[rocket::async_test]
async fn signed_out_visitors_are_sent_to_login() {
    let (client, _) = seeded().await;

    for uri in ["/", "/complaints", "/reports", "/credits"] {
        let response = client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther, "{uri}");
        assert_eq!(response.headers().get_one("Location"), Some("/login"), "{uri}");
    }
}

#[rocket::async_test]
async fn bad_credentials_show_inline_error() {
    let (client, _) = seeded().await;

    let response = client
        .post("/login")
        .header(rocket::http::ContentType::Form)
        .body("email=admin%40example.com&password=nope")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().await.unwrap();
    assert!(body.contains("Invalid email or password"));
    assert!(client.cookies().get_private("user").is_none());
}

#[rocket::async_test]
async fn login_and_logout_manage_session_cookies() {
    let (client, _) = seeded().await;
    login(&client, ADMIN_EMAIL).await;

    assert!(client.cookies().get_private("user").is_some());
    assert!(client.cookies().get_private("token").is_some());

    let (status, body) = get_page(&client, "/").await;
    assert_eq!(status, Status::Ok);
    assert!(body.contains("Welcome back!"));
    assert!(body.contains("been successfully logged in."));
    assert!(body.contains("Welcome to EcoWaste, Admin User!"));

    let (status, _) = post_form(&client, "/onboarding/seen", "").await;
    assert_eq!(status, Status::SeeOther);
    let (_, body) = get_page(&client, "/").await;
    assert!(!body.contains("Welcome to EcoWaste, Admin User!"));

    let (status, location) = post_form(&client, "/logout", "").await;
    assert_eq!(status, Status::SeeOther);
    assert_eq!(location.as_deref(), Some("/login"));
    assert!(client.cookies().get_private("user").is_none());
    assert!(client.cookies().get_private("token").is_none());
    assert!(client.cookies().get_private("seen_onboarding").is_none());

    let response = client.get("/complaints").dispatch().await;
    assert_eq!(response.headers().get_one("Location"), Some("/login"));
}

#[rocket::async_test]
async fn regular_users_cannot_open_admin_views() {
    let (client, _) = seeded().await;
    login(&client, "john@example.com").await;

    let (status, body) = get_page(&client, "/complaints").await;
    assert_eq!(status, Status::Forbidden);
    assert!(body.contains("Admin access required"));

    let (status, _) = post_form(&client, "/credits", "user_id=1&amount=500").await;
    assert_eq!(status, Status::Forbidden);

    let (status, body) = get_page(&client, "/").await;
    assert_eq!(status, Status::Ok);
    assert!(body.contains("Green Hero"));
}

#[rocket::async_test]
async fn assigning_and_completing_a_complaint() {
    let (client, backend) = seeded().await;
    login(&client, ADMIN_EMAIL).await;

    let (status, body) = get_page(&client, "/complaints").await;
    assert_eq!(status, Status::Ok);
    assert!(body.contains("Overflowing public bin"));

    let (status, location) = post_form(&client, "/complaints/1/assign", "worker_id=3").await;
    assert_eq!(status, Status::SeeOther);
    assert_eq!(location.as_deref(), Some("/complaints"));

    let complaint = backend.complaint(1).unwrap();
    assert_eq!(complaint.status, ComplaintStatus::Assigned);
    assert_eq!(complaint.assigned_worker.unwrap().name, "Sam Okafor");

    let (_, body) = get_page(&client, "/complaints").await;
    assert!(body.contains("Sam Okafor has been assigned to complaint #1."));
    assert!(body.contains("555-0103"));

    post_form(&client, "/complaints/1/complete", "").await;
    assert_eq!(backend.complaint(1).unwrap().status, ComplaintStatus::Completed);
}

#[rocket::async_test]
async fn assigning_an_already_assigned_complaint_is_refused() {
    let (client, backend) = seeded().await;
    login(&client, ADMIN_EMAIL).await;

    // Complaint 2 is already assigned.
    post_form(&client, "/complaints/2/assign", "worker_id=1").await;
    assert_eq!(backend.complaint(2).unwrap().assigned_worker.unwrap().id, 2);

    let (_, body) = get_page(&client, "/complaints").await;
    assert!(body.contains("Error assigning worker"));
}

#[rocket::async_test]
async fn report_status_moves_forward() {
    let (client, backend) = seeded().await;
    login(&client, ADMIN_EMAIL).await;

    let (_, body) = get_page(&client, "/reports").await;
    assert!(body.contains("Mark as Reviewed"));
    assert!(body.contains("waiting for review"));

    post_form(&client, "/reports/1/status", "status=reviewed").await;
    assert_eq!(backend.report(1).unwrap().status, ReportStatus::Reviewed);

    post_form(&client, "/reports/1/status", "status=pending").await;
    assert_eq!(backend.report(1).unwrap().status, ReportStatus::Reviewed);

    post_form(&client, "/reports/1/status", "status=resolved").await;
    assert_eq!(backend.report(1).unwrap().status, ReportStatus::Resolved);
}

#[rocket::async_test]
async fn no_reports_shows_placeholder() {
    let backend = Arc::new(MemoryBackend::new(ADMIN_EMAIL, 100));
    backend.insert_account("Admin User", ADMIN_EMAIL, "demo", Role::Admin, 0);
    let client = client_with(backend).await;
    login(&client, ADMIN_EMAIL).await;

    let (status, body) = get_page(&client, "/reports").await;
    assert_eq!(status, Status::Ok);
    assert!(body.contains("No worker reports have been submitted yet."));
    assert!(!body.contains("waiting for review"));
}

#[rocket::async_test]
async fn adding_credits() {
    let (client, backend) = seeded().await;
    login(&client, ADMIN_EMAIL).await;
    let jane = UserId::Numeric(2);

    let (status, _) = post_form(&client, "/credits", "user_id=2&amount=25").await;
    assert_eq!(status, Status::SeeOther);
    assert_eq!(backend.profile(&jane).unwrap().credits, 70);

    let (_, body) = get_page(&client, "/credits").await;
    assert!(body.contains("Added 25 credits to Jane Smith."));
    assert!(body.contains("Eco Warrior"));
}

#[rocket::async_test]
async fn non_positive_credit_amounts_are_rejected_without_a_request() {
    let (client, backend) = seeded().await;
    login(&client, ADMIN_EMAIL).await;
    let calls = backend.gateway_calls();

    for amount in ["0", "-10", "abc", "1000001", "9223372036854775807"] {
        let (status, location) =
            post_form(&client, "/credits", &format!("user_id=1&amount={amount}")).await;
        assert_eq!(status, Status::SeeOther);
        assert_eq!(location.as_deref(), Some("/credits"));
    }

    assert_eq!(backend.gateway_calls(), calls);
    assert_eq!(backend.profile(&UserId::Numeric(1)).unwrap().credits, 120);

    let (_, body) = get_page(&client, "/credits").await;
    assert!(body.contains("Invalid amount"));
}

#[rocket::async_test]
async fn active_and_used_codes_get_distinct_badges() {
    let (client, backend) = seeded().await;
    backend.insert_redeem_code(RedeemCode {
        id: 2,
        code: "ECO-USED-01".to_string(),
        user_id: UserId::Numeric(2),
        created_at: chrono::Utc::now(),
        redeemed: true,
    });
    login(&client, ADMIN_EMAIL).await;

    let (_, body) = get_page(&client, "/credits").await;
    assert!(body.contains(r#"<span class="badge badge-secondary">Active</span>"#));
    assert!(body.contains(r#"<span class="badge badge-default">Used</span>"#));
}

#[rocket::async_test]
async fn crediting_own_account_updates_the_session() {
    let (client, _) = seeded().await;
    login(&client, ADMIN_EMAIL).await;

    post_form(&client, "/credits", "user_id=3&amount=40").await;

    let stored = client.cookies().get_private("user").unwrap();
    assert!(stored.value().contains("\"credits\":40"));
}

#[rocket::async_test]
async fn signup_creates_a_signed_in_account() {
    let (client, backend) = seeded().await;

    let (status, location) = post_form(
        &client,
        "/signup",
        "name=Priya%20Nair&email=priya%40example.com&password=secret1",
    )
    .await;
    assert_eq!(status, Status::SeeOther);
    assert_eq!(location.as_deref(), Some("/"));

    let (_, body) = get_page(&client, "/").await;
    assert!(body.contains("Priya Nair"));
    assert!(body.contains("Account created"));
    assert_eq!(backend.profile(&UserId::Numeric(4)).unwrap().credits, 100);
}

#[rocket::async_test]
async fn signup_surfaces_validation_and_backend_messages() {
    let (client, _) = seeded().await;

    let response = client
        .post("/signup")
        .header(rocket::http::ContentType::Form)
        .body("name=Short&email=short%40example.com&password=abc")
        .dispatch()
        .await;
    let body = response.into_string().await.unwrap();
    assert!(body.contains("Password must be at least 6 characters."));

    let response = client
        .post("/signup")
        .header(rocket::http::ContentType::Form)
        .body("name=John&email=john%40example.com&password=secret1")
        .dispatch()
        .await;
    let body = response.into_string().await.unwrap();
    assert!(body.contains("User already registered"));
}
