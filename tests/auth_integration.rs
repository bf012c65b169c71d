use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::time::Duration;
use token_gateway::auth::{hash_password, AuthGateway, RefreshTokenStore};
use token_gateway::configuration::{ApplicationSettings, AuthSettings, Settings, TokenSettings};
use token_gateway::startup::run;

pub struct TestApp {
    pub address: String,
    pub store: RefreshTokenStore,
}

fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        tokens: TokenSettings {
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            access_token_expiry: 15,
            refresh_token_expiry: None,
            issuer: "test".to_string(),
            refresh_enabled: true,
            refresh_revocable: true,
        },
        auth: AuthSettings::default(),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(test_settings()).await
}

async fn spawn_app_with(settings: Settings) -> TestApp {
    token_gateway::telemetry::init_telemetry("warn");
    settings.validate().expect("Invalid test settings");

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = RefreshTokenStore::new();
    let gateway = AuthGateway::from_settings(&settings, store.clone());
    let server = run(listener, gateway).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, store }
}

async fn login(app: &TestApp, client: &reqwest::Client, username: &str) -> Value {
    let response = client
        .post(&format!("{}/login", &app.address))
        .json(&json!({ "username": username }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

async fn get_me(app: &TestApp, client: &reqwest::Client, token: &str) -> reqwest::Response {
    client
        .get(&format!("{}/me", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn post_token(app: &TestApp, client: &reqwest::Client, token: &str) -> reqwest::Response {
    client
        .post(&format!("{}/token", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn logout(app: &TestApp, client: &reqwest::Client, token: &str) -> reqwest::Response {
    client
        .delete(&format!("{}/logout", &app.address))
        .json(&json!({ "token": token }))
        .send()
        .await
        .expect("Failed to execute request.")
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_both_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;

    let refresh_token = body["refreshToken"].as_str().expect("No refresh token");
    assert!(body["accessToken"].as_str().is_some());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 15);
    assert!(app.store.contains(refresh_token));
}

#[tokio::test]
async fn login_returns_400_for_invalid_payload() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let test_cases = vec![
        (json!({}), "missing username"),
        (json!({ "username": "" }), "empty username"),
        (json!({ "username": "   " }), "blank username"),
        (json!({ "username": "<script>" }), "malformed username"),
    ];

    for (body, reason) in test_cases {
        let response = client
            .post(&format!("{}/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(),
            "Should reject request: {}", reason);
    }
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn login_returns_access_token_only_when_refresh_disabled() {
    let mut settings = test_settings();
    settings.tokens.refresh_enabled = false;
    let app = spawn_app_with(settings).await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;

    assert!(body["accessToken"].as_str().is_some());
    assert!(body.get("refreshToken").is_none());
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn login_checks_passwords_when_users_are_configured() {
    let mut users = HashMap::new();
    users.insert("Jane".to_string(), hash_password("SecurePass123").unwrap());
    let mut settings = test_settings();
    settings.auth = AuthSettings { users };
    let app = spawn_app_with(settings).await;
    let client = reqwest::Client::new();

    let test_cases = vec![
        (json!({ "username": "Jane", "password": "WrongPass123" }), "wrong password"),
        (json!({ "username": "John", "password": "SecurePass123" }), "unknown user"),
        (json!({ "username": "Jane" }), "missing password"),
    ];

    for (body, reason) in test_cases {
        let response = client
            .post(&format!("{}/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(),
            "Should reject login: {}", reason);
        let response_body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(response_body["code"], "INVALID_CREDENTIALS");
    }

    let response = client
        .post(&format!("{}/login", &app.address))
        .json(&json!({ "username": "Jane", "password": "SecurePass123" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
}

// --- Protected Route Tests ---

#[tokio::test]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_rejects_malformed_authorization_header() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let malformed_headers = vec![
        "Bearer",
        "Basic dXNlcjpwYXNz",
        "BearerToken",
        "",
    ];

    for header in malformed_headers {
        let response = client
            .get(&format!("{}/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(),
            "Should reject malformed header: {}", header);
    }
}

#[tokio::test]
async fn protected_route_accepts_lowercase_bearer_scheme() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let access_token = body["accessToken"].as_str().unwrap();

    let response = client
        .get(&format!("{}/me", &app.address))
        .header("Authorization", format!("bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn protected_route_returns_403_with_invalid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = get_me(&app, &client, "invalid.token.here").await;

    assert_eq!(403, response.status().as_u16());
    let request_id = response
        .headers()
        .get("X-Request-Id")
        .expect("Missing X-Request-Id header")
        .to_str()
        .unwrap()
        .to_string();
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "TOKEN_REJECTED");
    assert_eq!(response_body["error_id"], request_id);
}

#[tokio::test]
async fn protected_route_resolves_identity_from_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let access_token = body["accessToken"].as_str().unwrap();

    let response = get_me(&app, &client, access_token).await;

    assert_eq!(200, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body, json!({ "name": "Jane" }));
}

#[tokio::test]
async fn protected_route_rejects_refresh_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let refresh_token = body["refreshToken"].as_str().unwrap();

    let response = get_me(&app, &client, refresh_token).await;

    assert_eq!(403, response.status().as_u16());
}

// --- Token Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let access_token = body["accessToken"].as_str().unwrap();
    let refresh_token = body["refreshToken"].as_str().unwrap();

    let response = post_token(&app, &client, refresh_token).await;

    assert_eq!(200, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    let new_access_token = response_body["accessToken"].as_str().expect("No access token");
    assert_ne!(access_token, new_access_token);
    assert!(response_body.get("refreshToken").is_none());

    let me: Value = get_me(&app, &client, new_access_token).await.json().await.unwrap();
    assert_eq!(me["name"], "Jane");

    // Refresh token is not rotated
    assert_eq!(200, post_token(&app, &client, refresh_token).await.status().as_u16());
}

#[tokio::test]
async fn refresh_is_also_served_on_get_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let refresh_token = body["refreshToken"].as_str().unwrap();

    let response = client
        .get(&format!("{}/accessToken", &app.address))
        .header("Authorization", format!("Bearer {}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_401_without_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/token", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_403_for_unknown_or_wrong_kind_of_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let access_token = body["accessToken"].as_str().unwrap();

    for token in ["definitely_not_a_valid_token", access_token] {
        let response = post_token(&app, &client, token).await;

        assert_eq!(403, response.status().as_u16(), "Should reject token: {}", token);
        let response_body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(response_body["code"], "TOKEN_REJECTED");
    }
}

// --- Revocation Tests ---

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let refresh_token = body["refreshToken"].as_str().unwrap();

    assert_eq!(204, logout(&app, &client, refresh_token).await.status().as_u16());
    assert!(!app.store.contains(refresh_token));

    let response = post_token(&app, &client, refresh_token).await;
    assert_eq!(403, response.status().as_u16());

    // Revoking again is still fine
    assert_eq!(204, logout(&app, &client, refresh_token).await.status().as_u16());
}

#[tokio::test]
async fn logout_all_revokes_every_session_of_caller() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let first = login(&app, &client, "Jane").await;
    let second = login(&app, &client, "Jane").await;
    let other = login(&app, &client, "John").await;

    let response = client
        .delete(&format!("{}/logout/all", &app.address))
        .header("Authorization", format!("Bearer {}", first["accessToken"].as_str().unwrap()))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, response.status().as_u16());

    for session in [&first, &second] {
        let response = post_token(&app, &client, session["refreshToken"].as_str().unwrap()).await;
        assert_eq!(403, response.status().as_u16());
    }
    let response = post_token(&app, &client, other["refreshToken"].as_str().unwrap()).await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn logout_all_requires_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(&format!("{}/logout/all", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

// --- Full lifecycle ---

#[tokio::test]
async fn access_token_expires_and_refresh_token_outlives_it_until_revoked() {
    let mut settings = test_settings();
    settings.tokens.access_token_expiry = 1;
    let app = spawn_app_with(settings).await;
    let client = reqwest::Client::new();

    let body = login(&app, &client, "Jane").await;
    let access_token = body["accessToken"].as_str().unwrap();
    let refresh_token = body["refreshToken"].as_str().unwrap();

    let response = get_me(&app, &client, access_token).await;
    assert_eq!(200, response.status().as_u16());

    tokio::time::sleep(Duration::from_secs(3)).await;

    let response = get_me(&app, &client, access_token).await;
    assert_eq!(403, response.status().as_u16(), "Access token should have expired");

    let response = post_token(&app, &client, refresh_token).await;
    assert_eq!(200, response.status().as_u16());
    let response_body: Value = response.json().await.unwrap();
    let new_access_token = response_body["accessToken"].as_str().unwrap();
    assert_ne!(access_token, new_access_token);

    let me: Value = get_me(&app, &client, new_access_token).await.json().await.unwrap();
    assert_eq!(me, json!({ "name": "Jane" }));

    assert_eq!(204, logout(&app, &client, refresh_token).await.status().as_u16());
    let response = post_token(&app, &client, refresh_token).await;
    assert_eq!(403, response.status().as_u16());
}
