use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::database::SharedStore;
use crate::handlers;
use crate::middleware::session_middleware;
use crate::services::{AccountService, LoanService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub loans: Arc<LoanService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            loans: Arc::new(LoanService::new(store.clone())),
            accounts: Arc::new(AccountService::new(store.clone())),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = config::config();

    // Session resolution only wraps /api routes
    let api = Router::new()
        .merge(auth_routes())
        .merge(loan_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(api)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn auth_routes() -> Router<AppState> {
    use handlers::protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn loan_routes() -> Router<AppState> {
    use handlers::protected::loans;

    Router::new()
        // Collection
        .route("/api/loans", get(loans::loans_list).post(loans::loans_create))
        // Single record
        .route(
            "/api/loans/:id",
            get(loans::loan_get)
                .put(loans::loan_put)
                .delete(loans::loan_delete),
        )
        .route("/api/loans/:id/status", put(loans::loan_status_put))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("CORS: ignoring invalid origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Loan Ledger",
            "version": version,
            "description": "Owner-scoped personal loan records",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "loans": "/api/loans[/:id[/status]] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend_name();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "backend": backend
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "backend": backend
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(Arc::new(MemoryStore::new())))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn sign_up(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": "password-123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    fn jane() -> Value {
        json!({
            "borrowerName": "Jane Doe",
            "amount": 1000,
            "interestRate": 5,
            "term": 12,
            "description": "test"
        })
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["backend"], "memory");
    }

    #[tokio::test]
    async fn anonymous_requests_are_unauthorized() {
        let app = test_app();
        let id = uuid::Uuid::new_v4();
        let cases = [
            (Method::GET, "/api/loans".to_string(), None),
            (Method::POST, "/api/loans".to_string(), Some(jane())),
            (Method::GET, format!("/api/loans/{}", id), None),
            (Method::PUT, format!("/api/loans/{}", id), Some(jane())),
            (Method::PUT, format!("/api/loans/{}/status", id), Some(json!({ "status": "paid" }))),
            (Method::DELETE, format!("/api/loans/{}", id), None),
            (Method::GET, "/api/auth/whoami".to_string(), None),
        ];

        for (method, uri, body) in cases {
            let (status, body) = send(&app, method.clone(), &uri, None, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(body["success"], false);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn forged_tokens_are_rejected() {
        let app = test_app();
        let (status, _) = send(&app, Method::GET, "/api/loans", Some("abc.def.ghi"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn loan_lifecycle_over_http() {
        let app = test_app();
        let token = sign_up(&app, "owner@example.com").await;

        let (status, body) = send(&app, Method::POST, "/api/loans", Some(&token), Some(jane())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, "/api/loans", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let loans = body["data"].as_array().unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0]["status"], "pending");
        assert_eq!(loans[0]["borrowerName"], "Jane Doe");

        let uri = format!("/api/loans/{}/status", id);
        let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "active" }))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let uri = format!("/api/loans/{}", id);
        let (_, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(body["data"]["status"], "active");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Loan not found or unauthorized");
    }

    #[tokio::test]
    async fn non_owner_gets_not_found() {
        let app = test_app();
        let owner = sign_up(&app, "a@example.com").await;
        let other = sign_up(&app, "b@example.com").await;

        let (_, body) = send(&app, Method::POST, "/api/loans", Some(&owner), Some(jane())).await;
        let uri = format!("/api/loans/{}", body["data"]["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::GET, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, Method::GET, "/api/loans", Some(&other), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        // Same answer as for an id that never existed
        let missing = format!("/api/loans/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &missing, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn boundary_rejects_bad_status_and_status_on_create() {
        let app = test_app();
        let token = sign_up(&app, "strict@example.com").await;
        let (_, body) = send(&app, Method::POST, "/api/loans", Some(&token), Some(jane())).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/loans/{}/status", id);
        let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "closed" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let mut with_status = jane();
        with_status["status"] = json!("paid");
        let (status, _) = send(&app, Method::POST, "/api/loans", Some(&token), Some(with_status)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/loans?status=bogus", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whoami_and_duplicate_registration() {
        let app = test_app();
        let token = sign_up(&app, "me@example.com").await;

        let (status, body) = send(&app, Method::GET, "/api/auth/whoami", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "me@example.com");

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "me@example.com", "password": "password-456" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "me@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
