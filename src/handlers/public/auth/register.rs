use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Credentials, SessionGrant};

/// POST /auth/register - Create an account and receive a session token
///
/// Expected Input:
/// ```json
/// { "email": "jane@example.com", "password": "at-least-8-chars" }
/// ```
///
/// 201 with `{ token, user, expiresIn }`, 409 if the email is taken,
/// 400 if the email or password fails validation.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<SessionGrant> {
    let Json(credentials) = payload?;
    let grant = state.accounts.register(credentials).await?;
    Ok(ApiResponse::created(grant))
}
