use chrono::Utc;
use ecowaste_admin::config::HostedSettings;
use ecowaste_admin::models::{AuthSession, AuthStateChange, AuthToken, Profile, Role, SignupOutcome, UserId};
use ecowaste_admin::services::token::Claims;
use ecowaste_admin::services::{AuthBackend, DataGateway, GatewayError, HostedBackend};
use httpmock::Method::{GET, PATCH, POST};
use httpmock::MockServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

const ANON_KEY: &str = "anon-key";
const USER_ID: &str = "5f0c3f7e-9a4b-4c1e-8d2a-1b2c3d4e5f60";

fn backend(server: &MockServer) -> HostedBackend {
    HostedBackend::new(HostedSettings {
        url: server.base_url(),
        anon_key: ANON_KEY.to_string(),
        jwt_secret: None,
        admin_email: "admin@example.com".to_string(),
        signup_credit_grant: 100,
    })
}

fn user_id() -> Uuid {
    Uuid::parse_str(USER_ID).unwrap()
}

fn access_token(exp: i64) -> String {
    let claims = Claims {
        sub: USER_ID.to_string(),
        email: Some("jane@example.com".to_string()),
        exp,
        iat: Some(exp - 3600),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"project-secret")).unwrap()
}

fn stored_session(exp: i64) -> AuthSession {
    AuthSession {
        profile: Profile {
            id: UserId::Uuid(user_id()),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            role: Role::User,
            credits: 45,
        },
        token: AuthToken {
            access_token: access_token(exp),
            refresh_token: Some("rt-old".to_string()),
            expires_at: None,
        },
    }
}

#[tokio::test]
async fn signup_without_session_asks_for_confirmation() {
    let server = MockServer::start_async().await;
    let signup = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/signup")
                .header("apikey", ANON_KEY)
                .body_contains("\"name\":\"Jane Smith\"");
            then.status(200)
                .json_body(json!({ "id": USER_ID, "email": "jane@example.com" }));
        })
        .await;
    let profiles = server
        .mock_async(|when, then| {
            when.path("/rest/v1/profiles");
            then.status(200).json_body(json!([]));
        })
        .await;

    let outcome = backend(&server)
        .signup("jane@example.com", "secret123", "Jane Smith")
        .await
        .unwrap();
    assert_eq!(outcome, SignupOutcome::ConfirmationRequired);

    signup.assert_async().await;
    profiles.assert_hits_async(0).await;
}

#[tokio::test]
async fn signup_failures_keep_backend_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/signup");
            then.status(429)
                .json_body(json!({ "msg": "Email rate limit exceeded" }));
        })
        .await;

    let err = backend(&server)
        .signup("jane@example.com", "secret123", "Jane Smith")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(message) if message == "Email rate limit exceeded"));
}

#[tokio::test]
async fn first_login_provisions_admin_profile() {
    let server = MockServer::start_async().await;
    let grant = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password")
                .header("apikey", ANON_KEY)
                .json_body(json!({ "email": "admin@example.com", "password": "secret123" }));
            then.status(200).json_body(json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600,
                "user": { "id": USER_ID, "email": "admin@example.com", "user_metadata": {} }
            }));
        })
        .await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", format!("eq.{USER_ID}"))
                .query_param("select", "*")
                .header("Authorization", "Bearer at-1");
            then.status(200).json_body(json!([]));
        })
        .await;
    let created = json!({
        "id": USER_ID,
        "name": "admin",
        "email": "admin@example.com",
        "role": "admin",
        "credits": 100
    });
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/profiles")
                .header("Prefer", "return=representation")
                .json_body(created.clone());
            then.status(201).json_body(json!([created]));
        })
        .await;

    let session = backend(&server)
        .login("admin@example.com", "secret123")
        .await
        .unwrap();
    assert_eq!(session.profile.id, UserId::Uuid(user_id()));
    assert_eq!(session.profile.role, Role::Admin);
    assert_eq!(session.profile.credits, 100);
    assert_eq!(session.token.access_token, "at-1");
    assert_eq!(session.token.refresh_token.as_deref(), Some("rt-1"));
    assert!(session.token.expires_at.is_some());

    grant.assert_async().await;
    lookup.assert_async().await;
    insert.assert_async().await;
}

#[tokio::test]
async fn expiring_session_is_refreshed_on_resume() {
    let server = MockServer::start_async().await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "refresh_token")
                .json_body(json!({ "refresh_token": "rt-old" }));
            then.status(200).json_body(json!({
                "access_token": "at-new",
                "refresh_token": "rt-new",
                "expires_in": 3600,
                "user": { "id": USER_ID, "email": "jane@example.com", "user_metadata": {} }
            }));
        })
        .await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .header("Authorization", "Bearer at-new");
            then.status(200).json_body(json!([{
                "id": USER_ID,
                "name": "Jane Smith",
                "email": "jane@example.com",
                "role": "user",
                "credits": 80
            }]));
        })
        .await;

    let stored = stored_session(Utc::now().timestamp() + 10);
    let change = backend(&server).resume(stored).await.unwrap();

    let session = match change {
        AuthStateChange::TokenRefreshed(session) => session,
        other => panic!("expected a refreshed session, got {other:?}"),
    };
    assert_eq!(session.token.access_token, "at-new");
    assert_eq!(session.token.refresh_token.as_deref(), Some("rt-new"));
    assert_eq!(session.profile.credits, 80);

    refresh.assert_async().await;
    lookup.assert_async().await;
}

#[tokio::test]
async fn valid_session_resumes_without_refresh() {
    let server = MockServer::start_async().await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200).json_body(json!([{ "id": USER_ID, "credits": 45 }]));
        })
        .await;

    let stored = stored_session(Utc::now().timestamp() + 3600);
    let change = backend(&server).resume(stored).await.unwrap();
    assert!(matches!(change, AuthStateChange::SignedIn(_)));

    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn adding_credits_writes_the_new_balance() {
    let server = MockServer::start_async().await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", format!("eq.{USER_ID}"))
                .query_param("select", "credits")
                .header("Authorization", "Bearer at-1");
            then.status(200).json_body(json!([{ "credits": 40 }]));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/profiles")
                .query_param("id", format!("eq.{USER_ID}"))
                .header("Prefer", "return=representation")
                .json_body(json!({ "credits": 65 }));
            then.status(200)
                .json_body(json!([{ "id": USER_ID, "credits": 65 }]));
        })
        .await;

    backend(&server)
        .add_credits(&AuthToken::bearer("at-1"), &UserId::Uuid(user_id()), 25)
        .await
        .unwrap();

    read.assert_async().await;
    write.assert_async().await;
}

#[tokio::test]
async fn overflowing_balance_is_never_written() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200)
                .json_body(json!([{ "credits": i64::MAX - 1 }]));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(PATCH).path("/rest/v1/profiles");
            then.status(200).json_body(json!([]));
        })
        .await;

    let err = backend(&server)
        .add_credits(&AuthToken::bearer("at-1"), &UserId::Uuid(user_id()), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(_)));

    write.assert_hits_async(0).await;
}
