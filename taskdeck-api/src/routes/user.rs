/// Current user endpoints
///
/// - `GET /user` - Profile of the authenticated user
/// - `POST /activate-premium` - Mock billing: flips the premium flag on

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskdeck_shared::{auth::middleware::AuthContext, models::user::User, notify::EventKind};

/// Premium activation response
#[derive(Debug, Serialize, Deserialize)]
pub struct PremiumResponse {
    pub message: String,
    pub is_premium: bool,
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Activates the premium tier
///
/// No payment is taken; activation is idempotent. The new tier applies from
/// the next request, since the flag is read when the session is resolved.
pub async fn activate_premium(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PremiumResponse>> {
    let user = User::set_premium(&state.db, auth.user_id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !auth.is_premium {
        tracing::info!(user_id = user.id, "Premium activated");
        state.notify(
            EventKind::PremiumActivated,
            user.id,
            json!({ "user_id": user.id }),
        );
    }

    Ok(Json(PremiumResponse {
        message: "User updated successfully".to_string(),
        is_premium: user.is_premium,
    }))
}
