use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Credentials, SessionGrant};

/// POST /auth/login - Authenticate and receive a session token
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<SessionGrant> {
    let Json(credentials) = payload?;
    let grant = state.accounts.login(credentials).await?;
    Ok(ApiResponse::success(grant))
}
