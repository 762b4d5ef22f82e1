//! Integration tests for the session facade

#![cfg(feature = "client")]

use serde_json::json;
use std::sync::Arc;
use studio_core::{LoginRequest, Role, SignupRequest};
use studio_http::client::{
    ClientError, FileTokenStore, MemoryTokenStore, Session, StudioClient, TokenKind, TokenStore,
    TokenTtl,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session_with(tokens: Arc<dyn TokenStore>) -> (MockServer, Session) {
    let server = MockServer::start().await;
    let client = StudioClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .token_store(tokens)
        .build()
        .unwrap();
    (server, Session::new(client))
}

async fn session() -> (MockServer, Session, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::default());
    let (server, session) = session_with(tokens.clone()).await;
    (server, session, tokens)
}

fn credentials() -> LoginRequest {
    LoginRequest {
        username: "ana".into(),
        password: "secret1".into(),
    }
}

fn signin_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token": "access-1",
        "refreshToken": "refresh-1",
        "type": "Bearer",
        "id": 1,
        "username": "ana",
        "email": "ana@example.com",
        "role": "CLIENT"
    }))
}

fn profile_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": 1,
        "username": "ana",
        "email": "ana@example.com",
        "firstName": "Ana",
        "lastName": "Silva",
        "role": "CLIENT",
        "createdAt": "2025-01-01T10:00:00"
    }))
}

#[tokio::test]
async fn test_login_stores_tokens_and_loads_profile() {
    let (server, session, tokens) = session().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .and(body_json(json!({ "username": "ana", "password": "secret1" })))
        .respond_with(signin_response())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(profile_response())
        .mount(&server)
        .await;

    let response = session.login(&credentials()).await.unwrap();

    assert_eq!(response.id, 1);
    assert_eq!(tokens.get(TokenKind::Access).as_deref(), Some("access-1"));
    assert_eq!(tokens.get(TokenKind::Refresh).as_deref(), Some("refresh-1"));
    assert!(session.is_authenticated());
    assert_eq!(session.profile().map(|p| p.username), Some("ana".into()));

    let profile = session.current_profile().await.unwrap();
    assert_eq!(profile.role, Role::Client);
}

#[tokio::test]
async fn test_login_survives_profile_failure() {
    let (server, session, tokens) = session().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(signin_response())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    session.login(&credentials()).await.unwrap();

    assert_eq!(session.profile(), None);
    assert_eq!(tokens.get(TokenKind::Access).as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_failed_login_keeps_existing_tokens() {
    let (server, session, tokens) = session().await;
    tokens.set("previous", "previous-refresh").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;

    let err = session.login(&credentials()).await.unwrap_err();

    assert_eq!(err.user_message("Login failed"), "Bad credentials");
    assert_eq!(tokens.get(TokenKind::Access).as_deref(), Some("previous"));
    assert_eq!(tokens.get(TokenKind::Refresh).as_deref(), Some("previous-refresh"));
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let (_server, session, tokens) = session().await;
    tokens.set("access-1", "refresh-1").unwrap();

    session.logout();
    assert_eq!(tokens.get(TokenKind::Access), None);
    assert_eq!(tokens.get(TokenKind::Refresh), None);
    assert!(!session.is_authenticated());

    // Logging out twice is fine
    session.logout();
    assert_eq!(tokens.get(TokenKind::Access), None);
}

#[tokio::test]
async fn test_profile_without_token_makes_no_request() {
    let (server, session, _tokens) = session().await;

    assert_eq!(session.current_profile().await, None);
    assert!(matches!(session.load_profile().await, Ok(None)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_forbidden_profile_ends_session() {
    let (server, session, tokens) = session().await;
    tokens.set("access-1", "refresh-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = session.load_profile().await.unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(tokens.get(TokenKind::Access), None);
    assert_eq!(tokens.get(TokenKind::Refresh), None);
}

#[tokio::test]
async fn test_failed_refresh_during_profile_ends_session() {
    let (server, session, tokens) = session().await;
    tokens.set("access-1", "refresh-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(session.current_profile().await, None);
    assert!(!session.is_authenticated());
    assert_eq!(tokens.get(TokenKind::Refresh), None);
}

#[tokio::test]
async fn test_server_error_keeps_session() {
    let (server, session, tokens) = session().await;
    tokens.set("access-1", "refresh-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = session.load_profile().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_auth_error());
    assert_eq!(session.current_profile().await, None);
    assert_eq!(tokens.get(TokenKind::Access).as_deref(), Some("access-1"));
    assert_eq!(tokens.get(TokenKind::Refresh).as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_signup_does_not_log_in() {
    let (server, session, tokens) = session().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({
            "username": "bea",
            "email": "bea@example.com",
            "password": "secret1",
            "firstName": "Bea",
            "lastName": "Costa",
            "phone": "912345678"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "User registered successfully!" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    session
        .signup(&SignupRequest {
            username: "bea".into(),
            email: "bea@example.com".into(),
            password: "secret1".into(),
            first_name: "Bea".into(),
            last_name: "Costa".into(),
            phone: Some("912345678".into()),
        })
        .await
        .unwrap();

    assert!(!session.is_authenticated());
    assert_eq!(tokens.get(TokenKind::Access), None);
}

#[tokio::test]
async fn test_signup_validation_and_backend_errors() {
    let (server, session, _tokens) = session().await;

    let mut fields = SignupRequest {
        username: "bea".into(),
        email: "not-an-email".into(),
        password: "secret1".into(),
        first_name: "Bea".into(),
        last_name: "Costa".into(),
        phone: None,
    };
    let err = session.signup(&fields).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref v) if v.field == "email"));
    assert!(server.received_requests().await.unwrap().is_empty());

    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "Error: Username is already taken!" })),
        )
        .mount(&server)
        .await;

    fields.email = "bea@example.com".into();
    let err = session.signup(&fields).await.unwrap_err();
    assert!(matches!(err, ClientError::BadRequest(_)));
    assert_eq!(
        err.user_message("Registration failed"),
        "Error: Username is already taken!"
    );
}

#[tokio::test]
async fn test_file_store_session_is_visible_to_next_client() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn TokenStore> =
        Arc::new(FileTokenStore::in_dir(dir.path(), TokenTtl::default()));
    let (server, session) = session_with(store).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(signin_response())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(profile_response())
        .mount(&server)
        .await;

    session.login(&credentials()).await.unwrap();

    // A second process reading the same directory sees the session
    let (_other_server, other) = session_with(Arc::new(FileTokenStore::in_dir(
        dir.path(),
        TokenTtl::default(),
    )))
    .await;
    assert!(other.is_authenticated());

    other.logout();
    assert!(!session.is_authenticated());
}
