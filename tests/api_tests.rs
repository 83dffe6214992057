//! HTTP API tests
//!
//! Exercise the full router, middleware included, with in-process requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;
use serde_json::{json, Value};
use tower::ServiceExt;

use wallet_sso::auth::AuthService;
use wallet_sso::config::Config;
use wallet_sso::routes::create_router;
use wallet_sso::state::AppState;
use wallet_sso::wallet::{address_of, eip191_payload, keccak256, WalletVerifiers};

// ============================================================================
// Helpers
// ============================================================================

fn test_app_with(vars: &[(&str, &str)]) -> Router {
    let mut all = vec![
        ("JWT_SECRET", "api-test-secret"),
        ("JWT_ISSUER", "https://sso.test/"),
        ("EVM_RPC_URLS", ""),
        ("POLKADOT_RPC_URLS", ""),
    ];
    all.extend_from_slice(vars);

    let config = Config::from_lookup(|key| {
        all.iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();

    let verifiers = WalletVerifiers::from_endpoints(
        &config.enabled_wallets,
        &config.evm_rpc_urls,
        &config.polkadot_rpc_urls,
    )
    .unwrap();
    let auth_service = Arc::new(AuthService::new(config.auth_config(), verifiers));

    create_router(AppState::new(auth_service, Arc::new(config)))
}

fn test_app() -> Router {
    test_app_with(&[])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn personal_sign(key: &SigningKey, message: &str) -> String {
    let digest = keccak256(eip191_payload(message).as_bytes());
    let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

/// Run challenge + login for a fresh key, returning the address and tokens
async fn login(app: &Router, chain_id: Option<u64>) -> (String, Value) {
    let key = SigningKey::random(&mut OsRng);
    let address = address_of(key.verifying_key());

    let (status, challenge) = send(
        app,
        post_json(
            "/auth/challenge",
            json!({ "address": address, "walletType": "metamask" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message = challenge["message"].as_str().unwrap().to_string();

    let (status, tokens) = send(
        app,
        post_json(
            "/auth/login",
            json!({
                "message": message,
                "signature": personal_sign(&key, &message),
                "address": address,
                "walletType": "metamask",
                "chainId": chain_id,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", tokens);
    (address, tokens)
}

// ============================================================================
// Health and discovery
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-content-type-options"].to_str().unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("strict-transport-security").is_none());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_hsts_in_production() {
    let app = test_app_with(&[("ENVIRONMENT", "production")]);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().get("strict-transport-security").is_some());
}

#[tokio::test]
async fn test_openid_configuration() {
    let app = test_app_with(&[("ENABLED_WALLETS", "polkadot")]);
    let request = Request::builder()
        .uri("/.well-known/openid-configuration")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issuer"], "https://sso.test/");
    assert_eq!(body["token_endpoint"], "https://sso.test/auth/login");
    assert_eq!(body["userinfo_endpoint"], "https://sso.test/user/profile");
    assert_eq!(body["id_token_signing_alg_values_supported"], json!(["HS256"]));
    assert_eq!(body["wallet_types_supported"], json!(["polkadot"]));
    assert!(body.get("jwks_uri").is_none());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = test_app();
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Challenge
// ============================================================================

#[tokio::test]
async fn test_challenge() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/auth/challenge",
            json!({ "address": "0xABC", "walletType": "metamask" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresIn"], 300);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("0xABC"));
    assert!(message.contains("METAMASK"));
    assert!(message.contains("Nonce: "));
}

#[tokio::test]
async fn test_challenge_missing_fields() {
    let app = test_app();
    let (status, body) = send(&app, post_json("/auth/challenge", json!({ "address": "0xABC" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_challenge_unknown_wallet_type() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/auth/challenge",
            json!({ "address": "0xABC", "walletType": "phantom" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_WALLET_TYPE");
}

#[tokio::test]
async fn test_challenge_disabled_wallet_type() {
    let app = test_app_with(&[("ENABLED_WALLETS", "metamask")]);
    let (status, body) = send(
        &app,
        post_json(
            "/auth/challenge",
            json!({ "address": "5Grw", "walletType": "polkadot" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_WALLET_TYPE");
}

// ============================================================================
// Login, verify, profile, refresh
// ============================================================================

#[tokio::test]
async fn test_login_verify_and_profile() {
    let app = test_app();
    let (address, tokens) = login(&app, Some(1)).await;

    assert_eq!(tokens["tokenType"], "Bearer");
    assert_eq!(tokens["expiresIn"], 3600);
    let access_token = tokens["accessToken"].as_str().unwrap();
    assert!(tokens["refreshToken"].is_string());
    assert!(tokens["idToken"].is_string());

    let (status, body) = send(&app, get_with_bearer("/auth/verify", access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], format!("metamask:{}", address.to_lowercase()));
    assert_eq!(body["user"]["walletType"], "metamask");
    assert_eq!(body["user"]["chainId"], 1);

    let (status, body) = send(&app, get_with_bearer("/user/profile", access_token)).await;
    assert_eq!(status, StatusCode::OK);
    let user = &body["user"];
    assert_eq!(user["address"], address.to_lowercase());
    assert!(user["createdAt"].is_string());
    assert!(user["lastLoginAt"].is_string());
    assert!(user.get("ensName").is_some());
    assert!(user.get("balance").is_some());
    assert!(user.get("nonce").is_none());
}

#[tokio::test]
async fn test_login_replay_is_rejected() {
    let app = test_app();
    let key = SigningKey::random(&mut OsRng);
    let address = address_of(key.verifying_key());

    let (_, challenge) = send(
        &app,
        post_json(
            "/auth/challenge",
            json!({ "address": address, "walletType": "metamask" }),
        ),
    )
    .await;
    let message = challenge["message"].as_str().unwrap();
    let login_body = json!({
        "message": message,
        "signature": personal_sign(&key, message),
        "address": address,
        "walletType": "metamask",
    });

    let (status, _) = send(&app, post_json("/auth/login", login_body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/auth/login", login_body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_CHALLENGE");
}

#[tokio::test]
async fn test_login_bad_signature() {
    let app = test_app();
    let key = SigningKey::random(&mut OsRng);
    let other = SigningKey::random(&mut OsRng);
    let address = address_of(key.verifying_key());

    let (_, challenge) = send(
        &app,
        post_json(
            "/auth/challenge",
            json!({ "address": address, "walletType": "metamask" }),
        ),
    )
    .await;
    let message = challenge["message"].as_str().unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            json!({
                "message": message,
                "signature": personal_sign(&other, message),
                "address": address,
                "walletType": "metamask",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn test_login_unknown_wallet_type() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            json!({
                "message": "anything",
                "signature": "0x00",
                "address": "0xABC",
                "walletType": "phantom",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_WALLET_TYPE");
}

#[tokio::test]
async fn test_refresh() {
    let app = test_app();
    let (_, tokens) = login(&app, None).await;

    let (status, refreshed) = send(
        &app,
        post_json(
            "/auth/refresh",
            json!({ "refreshToken": tokens["refreshToken"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["tokenType"], "Bearer");

    let access_token = refreshed["accessToken"].as_str().unwrap();
    let (status, _) = send(&app, get_with_bearer("/auth/verify", access_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_access_token() {
    let app = test_app();
    let (_, tokens) = login(&app, None).await;

    let (status, body) = send(
        &app,
        post_json(
            "/auth/refresh",
            json!({ "refreshToken": tokens["accessToken"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_refresh_for_unknown_user() {
    let first = test_app();
    let (_, tokens) = login(&first, None).await;

    // same secret, fresh registry
    let restarted = test_app();
    let (status, body) = send(
        &restarted,
        post_json(
            "/auth/refresh",
            json!({ "refreshToken": tokens["refreshToken"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_refresh_missing_token() {
    let app = test_app();
    let (status, body) = send(&app, post_json("/auth/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Bearer rejection
// ============================================================================

#[tokio::test]
async fn test_verify_without_token() {
    let app = test_app();
    let request = Request::builder()
        .uri("/auth/verify")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_verify_with_bad_token() {
    let app = test_app();
    let (status, body) = send(&app, get_with_bearer("/auth/verify", "not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_profile_rejects_refresh_token() {
    let app = test_app();
    let (_, tokens) = login(&app, None).await;
    let refresh_token = tokens["refreshToken"].as_str().unwrap();

    let (status, body) = send(&app, get_with_bearer("/user/profile", refresh_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}
