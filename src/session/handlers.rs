use axum::{extract::State, Json};
use tracing::{info, instrument};
use uuid::Uuid;

use super::types::SessionResponse;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new player identity
///
/// POST /session
/// Returns a JWT for a fresh player id with a generated display name
#[instrument(name = "create_session", skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let player_id = Uuid::new_v4().to_string();
    let display_name = petname::Petnames::default().generate_one(2, "-");

    let token = state.token_config.create_token(&player_id, &display_name)?;

    info!(player_id = %player_id, display_name = %display_name, "Session created");

    Ok(Json(SessionResponse {
        token,
        player_id,
        display_name,
    }))
}
