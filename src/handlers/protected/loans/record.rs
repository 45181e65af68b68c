use axum::{
    extract::rejection::JsonRejection,
    extract::{Extension, Path, State},
    Json,
};

use crate::app::AppState;
use crate::auth::Session;
use crate::database::models::{Loan, LoanDetails};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ServiceError;

/// GET /api/loans/:id - One loan, if the caller owns it
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Loan> {
    let loan = state.loans.get(&session, &id).await?;
    Ok(ApiResponse::success(loan))
}

/// PUT /api/loans/:id - Replace borrower, amount, rate, term and description
pub async fn put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<LoanDetails>, JsonRejection>,
) -> ApiResult<()> {
    if session.caller().is_none() {
        return Err(ServiceError::NotAuthenticated.into());
    }
    let Json(details) = payload?;
    state.loans.update(&session, &id, details).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /api/loans/:id - Remove an owned loan
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.loans.remove(&session, &id).await?;
    Ok(ApiResponse::no_content())
}
