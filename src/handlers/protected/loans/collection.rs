use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::Session;
use crate::database::models::{CreatedLoan, Loan, LoanDetails, LoanStatus};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Narrow to one status (served by the status index)
    pub status: Option<LoanStatus>,
}

/// GET /api/loans - All loans owned by the caller
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Loan>> {
    if session.caller().is_none() {
        return Err(ServiceError::NotAuthenticated.into());
    }
    let Query(query) = query?;
    let loans = state.loans.list(&session, query.status).await?;
    Ok(ApiResponse::success(loans))
}

/// POST /api/loans - Create a pending loan owned by the caller
///
/// Expected Input:
/// ```json
/// {
///   "borrowerName": "Jane Doe",
///   "amount": 1000,
///   "interestRate": 5,
///   "term": 12,
///   "description": "test"
/// }
/// ```
///
/// A `status` field is refused; new loans always start pending.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<LoanDetails>, JsonRejection>,
) -> ApiResult<CreatedLoan> {
    // Identity first, so anonymous callers get 401 even with a bad body
    if session.caller().is_none() {
        return Err(ServiceError::NotAuthenticated.into());
    }
    let Json(details) = payload?;
    let id = state.loans.create(&session, details).await?;
    Ok(ApiResponse::created(CreatedLoan { id }))
}
