//! HTTP boundary for the scan engine, using axum.
//!
//! The acting user is identified by the `x-user-id` header; session
//! handling proper is out of scope, so the boundary only resolves "does a
//! valid user id exist, and is it an admin" before delegating to the core.

use crate::error::ScanError;
use crate::ledger::{Role, User};
use crate::requests::CreditRequest;
use crate::scanner::{ScanEngine, ScanOutcome};
use crate::similarity::ScanResult;
use crate::store::Document;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Error payload returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// A failed request: status code plus the JSON payload.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-user-id header",
        )
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", "admin privileges required")
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let status = match err {
            ScanError::UnknownUser(_) | ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            ScanError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            ScanError::InvalidAmount => StatusCode::BAD_REQUEST,
            ScanError::AlreadyResolved(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub results: Vec<ScanResult>,
}

#[derive(Debug, Deserialize)]
pub struct CreditRequestBody {
    /// Accepted as signed so a negative amount surfaces as the domain
    /// error rather than a deserialization failure
    pub amount: i64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct CreditRequestsResponse {
    pub requests: Vec<CreditRequest>,
}

/// Build the API router over a shared engine.
pub fn router(engine: Arc<ScanEngine>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/users", post(register_handler))
        .route("/api/users/me", get(me_handler))
        .route("/api/scan", post(scan_handler))
        .route("/api/documents", get(documents_handler))
        .route(
            "/api/credit-requests",
            post(submit_request_handler).get(list_requests_handler),
        )
        .route("/api/credit-requests/{id}/approve", post(approve_handler))
        .route("/api/credit-requests/{id}/deny", post(deny_handler))
        .route("/api/analytics", get(analytics_handler))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Bind and serve until shutdown.
pub async fn run(port: u16, engine: Arc<ScanEngine>) -> Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    eprintln!("[server] listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Resolve the acting user from the `x-user-id` header.
fn acting_user(engine: &ScanEngine, headers: &HeaderMap) -> Result<User, ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;
    engine.user(user_id).ok_or_else(ApiError::unauthorized)
}

fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

async fn health_handler(State(engine): State<Arc<ScanEngine>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "users": engine.user_count(),
        "documents": engine.document_count(),
    }))
}

async fn register_handler(
    State(engine): State<Arc<ScanEngine>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.username.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_username",
            "username must not be empty",
        ));
    }
    if engine.user_by_name(&body.username).is_some() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "username_taken",
            format!("username already registered: {}", body.username),
        ));
    }
    let user = engine.register_user(&body.username, Role::User);
    eprintln!("[server] registered user {} id={}", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn me_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user = acting_user(&engine, &headers)?;
    // Re-apply the daily reset so the displayed balance is current
    let user = engine.refresh_user(&user.id)?;
    Ok(Json(user))
}

async fn scan_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let user = acting_user(&engine, &headers)?;

    // The similarity scan is CPU-bound; keep it off the async runtime
    let outcome = tokio::task::spawn_blocking(move || {
        engine.scan(&user.id, &body.title, &body.content)
    })
    .await
    .map_err(|e| ApiError::internal(format!("scan task failed: {}", e)))?
    .map_err(|e| ApiError::internal(format!("similarity backend failed: {}", e)))?;

    match outcome {
        ScanOutcome::Ranked(results) => Ok(Json(ScanResponse { results })),
        ScanOutcome::Rejected(err) => Err(err.into()),
    }
}

async fn documents_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let user = acting_user(&engine, &headers)?;
    Ok(Json(DocumentsResponse {
        documents: engine.documents_for(&user.id),
    }))
}

async fn submit_request_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
    Json(body): Json<CreditRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = acting_user(&engine, &headers)?;
    if body.amount <= 0 {
        return Err(ScanError::InvalidAmount.into());
    }
    let amount = u32::try_from(body.amount).map_err(|_| ScanError::InvalidAmount)?;
    let request = engine.submit_request(&user.id, amount, &body.reason)?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_requests_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
) -> Result<Json<CreditRequestsResponse>, ApiError> {
    let user = acting_user(&engine, &headers)?;
    let requests = if user.is_admin() {
        engine.all_requests()
    } else {
        engine.requests_for(&user.id)
    };
    Ok(Json(CreditRequestsResponse { requests }))
}

async fn approve_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CreditRequest>, ApiError> {
    let user = acting_user(&engine, &headers)?;
    require_admin(&user)?;
    let request = engine.approve_request(&id)?;
    eprintln!(
        "[server] approved request {} (+{} credits for {})",
        request.id, request.amount, request.username
    );
    Ok(Json(request))
}

async fn deny_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CreditRequest>, ApiError> {
    let user = acting_user(&engine, &headers)?;
    require_admin(&user)?;
    let request = engine.deny_request(&id)?;
    Ok(Json(request))
}

async fn analytics_handler(
    State(engine): State<Arc<ScanEngine>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = acting_user(&engine, &headers)?;
    require_admin(&user)?;
    Ok(Json(engine.report()))
}
