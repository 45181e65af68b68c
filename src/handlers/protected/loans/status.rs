use axum::{
    extract::rejection::JsonRejection,
    extract::{Extension, Path, State},
    Json,
};

use crate::app::AppState;
use crate::auth::Session;
use crate::database::models::StatusChange;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ServiceError;

/// PUT /api/loans/:id/status - Set the status and nothing else
///
/// Body: `{ "status": "pending" | "active" | "paid" | "defaulted" }`.
/// Anything else is a 400 before the loan is looked up.
pub async fn put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<()> {
    if session.caller().is_none() {
        return Err(ServiceError::NotAuthenticated.into());
    }
    let Json(change) = payload?;
    state.loans.update_status(&session, &id, change.status).await?;
    Ok(ApiResponse::no_content())
}
