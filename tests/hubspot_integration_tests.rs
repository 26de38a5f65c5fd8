//! End-to-end tests for the HubSpot OAuth flow
//!
//! wiremock plays HubSpot's token and contacts endpoints so the complete
//! authorize -> callback -> credentials -> load cycle runs against the real
//! router.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{form_body, TestHarness};
use hubspot_connector::cache::Cache;
use tower::ServiceExt;
use wiremock::{
    matchers::{body_string_contains, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn authorize(harness: &TestHarness, user_id: &str, org_id: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/authorize")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(&[
            ("user_id", user_id),
            ("org_id", org_id),
        ])))
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn state_param(authorization_url: &str) -> String {
    let url = url::Url::parse(authorization_url).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn test_full_authorization_flow() {
    let mock_server = MockServer::start().await;
    let harness = TestHarness::with_mock_provider(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=test-client-id"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .and(body_string_contains("code=mock_auth_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "mock_access_token_123",
            "token_type": "bearer",
            "expires_in": 1800,
            "refresh_token": "mock_refresh_token_456"
        })))
        .mount(&mock_server)
        .await;

    // Initiate and pull the state parameter the browser would carry back
    let auth_url = authorize(&harness, "u1", "o1").await;
    assert!(auth_url.contains("scope=crm.objects.contacts.read"));
    let state = state_param(&auth_url);

    // Provider redirects back with the code and state
    let request = Request::builder()
        .uri(format!(
            "/integrations/hubspot/oauth2callback?code=mock_auth_code&state={state}"
        ))
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("window.close()"));

    // The pending state was consumed by the callback
    let pending: Option<String> = harness
        .server
        .cache
        .get("pending_auth:o1:u1")
        .await
        .unwrap();
    assert!(pending.is_none());

    // One-shot pickup succeeds once
    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/credentials")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(&[
            ("user_id", "u1"),
            ("org_id", "o1"),
        ])))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let credentials: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(credentials["access_token"], "mock_access_token_123");
    assert_eq!(credentials["refresh_token"], "mock_refresh_token_456");

    // A second pickup finds nothing
    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/credentials")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(&[
            ("user_id", "u1"),
            ("org_id", "o1"),
        ])))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_with_foreign_state_never_reaches_token_endpoint() {
    let mock_server = MockServer::start().await;
    let harness = TestHarness::with_mock_provider(&mock_server.uri());

    // Any hit on the token endpoint fails the test
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    // State initiated for a different user/org pair
    let auth_url = authorize(&harness, "u-other", "o-other").await;
    let foreign_state = state_param(&auth_url);

    // Clear the pending entry so the callback sees nothing cached
    harness
        .server
        .cache
        .delete("pending_auth:o-other:u-other")
        .await
        .unwrap();

    let request = Request::builder()
        .uri(format!(
            "/integrations/hubspot/oauth2callback?code=abc&state={foreign_state}"
        ))
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let detail: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(detail["detail"], "State does not match");
}

#[tokio::test]
async fn test_token_endpoint_failure_leaves_no_credentials() {
    let mock_server = MockServer::start().await;
    let harness = TestHarness::with_mock_provider(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let auth_url = authorize(&harness, "u1", "o1").await;
    let state = state_param(&auth_url);

    let request = Request::builder()
        .uri(format!(
            "/integrations/hubspot/oauth2callback?code=bad_code&state={state}"
        ))
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(!harness
        .server
        .cache
        .exists("credentials:o1:u1")
        .await
        .unwrap());

    // The pending state survives a failed exchange; a retry with the same
    // state is still possible within its TTL
    assert!(harness
        .server
        .cache
        .exists("pending_auth:o1:u1")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_load_contacts_normalizes_records() {
    let mock_server = MockServer::start().await;
    let harness = TestHarness::with_mock_provider(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/contacts"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {
                    "id": "1",
                    "properties": { "firstname": "Ada", "lastname": "Lovelace" }
                },
                {
                    "id": "2",
                    "properties": { "firstname": "Grace", "lastname": "" }
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let credentials = r#"{"access_token":"tok"}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/load")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(&[("credentials", credentials)])))
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let items: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["id"], "1");
    assert_eq!(items[0]["name"], "Ada Lovelace");
    assert_eq!(items[0]["type"], "Contact");
    assert_eq!(items[0]["visibility"], true);
    assert_eq!(items[0]["directory"], false);
    assert!(items[0]["creation_time"].is_null());
    assert!(items[0]["drive_id"].is_null());
    assert_eq!(items[1]["name"], "Grace");
}

#[tokio::test]
async fn test_load_contacts_upstream_rejection() {
    let mock_server = MockServer::start().await;
    let harness = TestHarness::with_mock_provider(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/contacts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/load")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(&[(
            "credentials",
            r#"{"access_token":"expired"}"#,
        )])))
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
