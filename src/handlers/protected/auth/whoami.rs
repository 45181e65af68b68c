use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::auth::Session;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - The signed-in user's profile
pub async fn whoami(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<UserProfile> {
    let profile = state.accounts.whoami(&session).await?;
    Ok(ApiResponse::success(profile))
}
