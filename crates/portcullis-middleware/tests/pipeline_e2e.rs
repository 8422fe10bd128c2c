//! End-to-end pipeline integration tests.
//!
//! These run the auth stages together against a mocked identity provider:
//!
//! 1. Client auth - `POST /{realm}/oauth/introspect`
//! 2. User auth - `POST /{realm}/auth/introspect`
//! 3. Role gate - route policy over `X-User-Roles`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use portcullis_core::{AuthError, AuthResult, Role, RolePolicy, UserClaims, UserStatus};
use portcullis_introspect::{IntrospectionClient, IntrospectionConfig};
use portcullis_middleware::{
    current_user, BoxFuture, ClientAuthStage, MiddlewareContext, Pipeline, Request, Response,
    RoleGateStage, UserAuthStage,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REALM: &str = "acme";
const USER_ID: &str = "0192f5d4-7c1e-7a3b-9e4d-5f6a7b8c9d0e";

type Seen = Arc<Mutex<Option<HeaderMap>>>;

fn introspection_client(server: &MockServer) -> IntrospectionClient {
    let config = IntrospectionConfig::new(server.uri().parse().unwrap(), REALM)
        .with_timeout(Duration::from_secs(2));
    IntrospectionClient::new(&config).unwrap()
}

fn full_pipeline(server: &MockServer) -> Pipeline {
    let client = introspection_client(server);
    Pipeline::builder()
        .role_gate(RoleGateStage::new(
            RolePolicy::new()
                .with_rule("/admin", "*", ["admin"])
                .with_rule("/courses", "get", ["user", "admin"])
                .with_rule("/courses", "post", ["admin"]),
        ))
        .user_auth(UserAuthStage::new(client.clone()).with_public_endpoints(["/home", "/"]))
        .client_auth(ClientAuthStage::new(client))
        .build()
}

/// Handler that records the headers it was called with.
fn recording_handler(
    seen: &Seen,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>> {
    let seen = Arc::clone(seen);
    move |_ctx, request| {
        *seen.lock().unwrap() = Some(request.headers().clone());
        Box::pin(async { Ok(http::Response::new(Full::new(Bytes::from(r#"{"status":"ok"}"#)))) })
    }
}

fn make_request(method: Method, path: &str, headers: &[(&str, &str)]) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

fn authenticated_request(method: Method, path: &str) -> Request {
    make_request(
        method,
        path,
        &[
            ("client-authorization", "Bearer svc-token"),
            ("authorization", "Bearer user-token"),
            ("cookie", "session_id=s-1"),
        ],
    )
}

async fn mount_client(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/acme/oauth/introspect"))
        .and(body_json(json!({"token": "svc-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_user(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/acme/auth/introspect"))
        .and(header("cookie", "session_id=s-1"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn active_client() -> serde_json::Value {
    json!({
        "active": true,
        "token_type": "access",
        "sub": "web-frontend",
        "scope": "courses:read",
        "realm": "acme"
    })
}

fn active_user(roles: &str) -> serde_json::Value {
    json!({
        "active": true,
        "token_type": "access",
        "sub": USER_ID,
        "email": "alice@example.com",
        "status": "active",
        "realm": "acme",
        "roles": roles
    })
}

async fn error_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_full_pipeline_stamps_identity() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 200, active_user("admin user")).await;

    let pipeline = full_pipeline(&server);
    assert_eq!(pipeline.stage_names(), vec!["client_auth", "user_auth", "role_gate"]);

    let seen = Seen::default();
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&seen),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-client-id"], "web-frontend");
    assert_eq!(headers["x-client-scope"], "courses:read");
    assert_eq!(headers["x-client-realm"], "acme");
    assert_eq!(headers["x-user-id"], USER_ID);
    assert_eq!(headers["x-user-roles"], "admin user");
    assert_eq!(headers["x-user-realm"], "acme");
    assert_eq!(headers["x-user-status"], "active");
    assert_eq!(headers["x-user-email"], "alice@example.com");
}

#[tokio::test]
async fn test_handler_reads_current_user() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 200, active_user("user")).await;

    let response = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/profile"),
            |ctx, request| {
                let stored = ctx.get_extension::<UserClaims>().cloned();
                let user = current_user(&request);
                Box::pin(async move {
                    let user = user?;
                    assert_eq!(user.user_id.to_string(), USER_ID);
                    assert_eq!(user.roles, vec![Role::User]);
                    assert_eq!(user.status, UserStatus::Active);
                    assert!(stored.is_some());
                    user.require_any_role(&[Role::User])?;
                    Ok::<_, AuthError>(http::Response::new(Full::new(Bytes::new())))
                })
            },
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_path_skips_user_auth_only() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    Mock::given(method("POST"))
        .and(path("/acme/auth/introspect"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let seen = Seen::default();
    let request = make_request(Method::GET, "/home", &[("client-authorization", "Bearer svc-token")]);
    full_pipeline(&server)
        .process(MiddlewareContext::new(), request, recording_handler(&seen))
        .await
        .unwrap();

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-client-id"], "web-frontend");
    assert!(headers.get("x-user-id").is_none());
}

#[tokio::test]
async fn test_docs_path_passes_every_stage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let seen = Seen::default();
    let request = make_request(Method::GET, "/openapi.json", &[("x-client-id", "spoofed")]);
    full_pipeline(&server)
        .process(MiddlewareContext::new(), request, recording_handler(&seen))
        .await
        .unwrap();

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-client-id"], "spoofed");
}

#[tokio::test]
async fn test_missing_client_credential() {
    let server = MockServer::start().await;

    let err = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            make_request(Method::GET, "/courses", &[("client-authorization", "Token abc")]),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::bad_request("Invalid Bearer Token"));
}

#[tokio::test]
async fn test_inactive_client_token() {
    let server = MockServer::start().await;
    mount_client(&server, json!({"active": false, "cause": "Client disabled"})).await;

    let err = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::unauthenticated("Client disabled"));
}

#[tokio::test]
async fn test_absent_client_claims_remove_spoofed_headers() {
    let server = MockServer::start().await;
    mount_client(&server, json!({"active": true, "sub": "cli"})).await;

    let pipeline = Pipeline::builder()
        .client_auth(ClientAuthStage::new(introspection_client(&server)))
        .build();

    let seen = Seen::default();
    let request = make_request(
        Method::GET,
        "/reports",
        &[
            ("client-authorization", "Bearer svc-token"),
            ("x-client-scope", "admin:*"),
        ],
    );
    pipeline
        .process(MiddlewareContext::new(), request, recording_handler(&seen))
        .await
        .unwrap();

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-client-id"], "cli");
    assert!(headers.get("x-client-scope").is_none());
    assert!(headers.get("x-client-realm").is_none());
}

#[tokio::test]
async fn test_missing_session() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;

    let request = make_request(
        Method::GET,
        "/courses",
        &[
            ("client-authorization", "Bearer svc-token"),
            ("authorization", "Bearer user-token"),
        ],
    );
    let err = full_pipeline(&server)
        .process(MiddlewareContext::new(), request, recording_handler(&Seen::default()))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::unauthenticated("Session is missing"));
}

#[tokio::test]
async fn test_missing_user_bearer() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;

    let request = make_request(
        Method::GET,
        "/courses",
        &[
            ("client-authorization", "Bearer svc-token"),
            ("cookie", "session_id=s-1"),
        ],
    );
    let err = full_pipeline(&server)
        .process(MiddlewareContext::new(), request, recording_handler(&Seen::default()))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::unauthenticated("Invalid authorization header"));
}

#[tokio::test]
async fn test_refresh_token_is_malformed_request() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    let mut body = active_user("admin");
    body["token_type"] = json!("refresh");
    mount_user(&server, 200, body).await;

    let err = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/admin"),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::malformed_token_request("Invalid token type"));
}

#[tokio::test]
async fn test_inactive_user_token_checked_before_type() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(
        &server,
        200,
        json!({"active": false, "token_type": "refresh", "cause": "Session revoked"}),
    )
    .await;

    let err = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::unauthenticated("Session revoked"));
}

#[tokio::test]
async fn test_identity_provider_401_detail() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 401, json!({"detail": "expired"})).await;

    let response = full_pipeline(&server)
        .respond(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert_eq!(body["error"]["message"], "expired");
}

#[tokio::test]
async fn test_identity_provider_outage_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/oauth/introspect"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let response = full_pipeline(&server)
        .respond(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = error_body(response).await;
    assert_eq!(body["error"]["code"], "INTROSPECTION_PROTOCOL_ERROR");
}

#[tokio::test]
async fn test_non_uuid_subject_is_protocol_error() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    let mut body = active_user("user");
    body["sub"] = json!("alice");
    mount_user(&server, 200, body).await;

    let err = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IntrospectionProtocol { .. }));
}

#[tokio::test]
async fn test_role_gate_forbids_user_on_admin() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 200, active_user("user")).await;

    let response = full_pipeline(&server)
        .respond(
            MiddlewareContext::new(),
            authenticated_request(Method::POST, "/admin"),
            recording_handler(&Seen::default()),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = error_body(response).await;
    assert_eq!(body["error"]["message"], "Not authorized: required roles [admin]");
}

#[tokio::test]
async fn test_role_gate_allows_unlisted_method() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 200, active_user("guest")).await;

    let response = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::PUT, "/courses"),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_role_gate_without_user_auth_is_precondition_failure() {
    let pipeline = Pipeline::builder()
        .role_gate(RoleGateStage::new(RolePolicy::new().with_rule("/admin", "*", ["admin"])))
        .build();

    let err = pipeline
        .process(
            MiddlewareContext::new(),
            make_request(Method::GET, "/admin", &[]),
            recording_handler(&Seen::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_handler_not_called_after_rejection() {
    let server = MockServer::start().await;
    mount_client(&server, active_client()).await;
    mount_user(&server, 200, active_user("user")).await;

    let seen = Seen::default();
    let _ = full_pipeline(&server)
        .process(
            MiddlewareContext::new(),
            authenticated_request(Method::GET, "/admin"),
            recording_handler(&seen),
        )
        .await;

    assert!(seen.lock().unwrap().is_none());
}
