use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::types::{RoomCreateRequest, RoomResponse};
use crate::session::PlayerClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /rooms
/// The caller becomes the owner and takes seat 1
#[instrument(name = "create_room", skip(state, claims))]
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_service
        .create_room(&claims.player_id, request)
        .await?;

    info!(room_id = %room.id, owner_id = %room.owner_id, "Room created via HTTP");
    Ok(Json(room))
}

/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.room_service.list_rooms().await?;
    Ok(Json(rooms))
}

/// GET /rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state.room_service.get_room(&room_id).await?;
    Ok(Json(room))
}

/// POST /rooms/:room_id/join
#[instrument(name = "join_room", skip(state, claims))]
pub async fn join_room(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_service
        .join_room(&room_id, &claims.player_id)
        .await?;
    Ok(Json(room))
}
