use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::str::FromStr;
use tracing::{info, instrument};

use super::{
    board::{ExpandDirection, GridBounds},
    exchange::MixmoOutcome,
    models::GameEventRecord,
    service::GameService,
    types::{
        BagCountResponse, ExtractWordsRequest, MoveTileRequest, PlaceTileRequest, PlayerView,
        RecallResponse, TileRequest, WordsResponse,
    },
};
use crate::session::PlayerClaims;
use crate::shared::{AppError, AppState};

/// POST /rooms/:room_id/start
#[instrument(name = "start_game", skip(state, claims))]
pub async fn start_game(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .start_game(&room_id, &claims.player_id)
        .await?;
    info!(room_id = %room_id, "Game started via HTTP");
    Ok(Json(view))
}

/// GET /rooms/:room_id/state
#[instrument(name = "get_state", skip(state, claims))]
pub async fn get_state(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .player_view(&room_id, &claims.player_id)
        .await?;
    Ok(Json(view))
}

/// GET /rooms/:room_id/bag
#[instrument(name = "bag_count", skip(state))]
pub async fn bag_count(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<BagCountResponse>, AppError> {
    let remaining = state.game_service.bag_count(&room_id).await?;
    Ok(Json(BagCountResponse { room_id, remaining }))
}

/// POST /rooms/:room_id/tiles/place
#[instrument(name = "place_tile", skip(state, claims))]
pub async fn place_tile(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
    Json(request): Json<PlaceTileRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .place_tile(
            &room_id,
            &claims.player_id,
            request.seq,
            request.x,
            request.y,
            request.as_letter.as_deref(),
        )
        .await?;
    Ok(Json(view))
}

/// POST /rooms/:room_id/tiles/move
#[instrument(name = "move_tile", skip(state, claims))]
pub async fn move_tile(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
    Json(request): Json<MoveTileRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .move_tile(&room_id, &claims.player_id, request.seq, request.x, request.y)
        .await?;
    Ok(Json(view))
}

/// POST /rooms/:room_id/tiles/return
#[instrument(name = "return_tile", skip(state, claims))]
pub async fn return_tile(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
    Json(request): Json<TileRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .return_tile(&room_id, &claims.player_id, request.seq)
        .await?;
    Ok(Json(view))
}

/// POST /rooms/:room_id/tiles/lock
#[instrument(name = "lock_tile", skip(state, claims))]
pub async fn lock_tile(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
    Json(request): Json<TileRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .game_service
        .lock_tile(&room_id, &claims.player_id, request.seq)
        .await?;
    Ok(Json(view))
}

/// POST /rooms/:room_id/recall
#[instrument(name = "recall_tiles", skip(state, claims))]
pub async fn recall_tiles(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<RecallResponse>, AppError> {
    let (recalled, view) = state
        .game_service
        .recall_tiles(&room_id, &claims.player_id)
        .await?;
    Ok(Json(RecallResponse { recalled, view }))
}

/// POST /rooms/:room_id/mixmo
#[instrument(name = "request_mixmo", skip(state, claims))]
pub async fn request_mixmo(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<MixmoOutcome>, AppError> {
    let outcome = state
        .game_service
        .request_mixmo(&room_id, &claims.player_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /rooms/:room_id/expand/:direction
#[instrument(name = "expand_grid", skip(state, claims))]
pub async fn expand_grid(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path((room_id, direction)): Path<(String, String)>,
) -> Result<Json<GridBounds>, AppError> {
    let direction = ExpandDirection::from_str(&direction)
        .map_err(|_| AppError::BadRequest(format!("Unknown direction: {}", direction)))?;
    let bounds = state
        .game_service
        .expand_grid(&room_id, &claims.player_id, direction)
        .await?;
    Ok(Json(bounds))
}

/// GET /rooms/:room_id/words
#[instrument(name = "room_words", skip(state, claims))]
pub async fn room_words(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<WordsResponse>, AppError> {
    let words = state
        .game_service
        .words(&room_id, &claims.player_id)
        .await?;
    Ok(Json(WordsResponse { words }))
}

/// GET /rooms/:room_id/events
#[instrument(name = "room_events", skip(state, claims))]
pub async fn room_events(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<GameEventRecord>>, AppError> {
    let events = state
        .game_service
        .events(&room_id, &claims.player_id)
        .await?;
    Ok(Json(events))
}

/// POST /words
///
/// Extracts words from a posted board snapshot; touches no room.
pub async fn extract_words(Json(request): Json<ExtractWordsRequest>) -> Json<WordsResponse> {
    Json(WordsResponse {
        words: GameService::extract_words(&request.tiles),
    })
}
