use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::auth::Session;
use crate::error::ApiError;

/// Resolves the caller for every `/api` request and injects a [`Session`].
///
/// No `Authorization` header yields an anonymous session; the operations
/// themselves reject it. A header that is present but malformed, expired,
/// forged, or names a deleted user is rejected here with 401.
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match extract_jwt_from_headers(&headers) {
        Ok(None) => Session::anonymous(),
        Ok(Some(token)) => match state.accounts.resolve_session(&token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Rejected session token: {}", e);
                return ApiError::from(e).into_response();
            }
        },
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    // Auth schemes are case-insensitive
    let (scheme, token) = auth_str.split_once(' ').unwrap_or((auth_str, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format".to_string());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty JWT token".to_string());
    }
    Ok(Some(token.to_string()))
}
