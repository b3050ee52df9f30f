use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::socket::Connection;
use crate::shared::{AppError, AppState};

/// Browsers cannot set headers on a websocket upgrade, so the token travels in the query
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

/// GET /rooms/:room_id/ws?token=<jwt>
///
/// Streams the room's `RoomEvent`s to a seated player
#[instrument(name = "room_websocket", skip(ws, query, state))]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let claims = state
        .token_config
        .validate_token(&query.token)
        .map_err(|e| {
            warn!(error = %e, "WebSocket authentication failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

    let room = state.room_service.get_room(&room_id).await?;
    if !room.player_ids.contains(&claims.player_id) {
        warn!(room_id = %room_id, player_id = %claims.player_id, "Rejecting websocket for non-member");
        return Err(crate::game::GameError::NotInRoom.into());
    }

    // Subscribe before upgrading so nothing committed after this point is missed
    let events = state.event_bus.subscribe_to_room(&room_id).await;
    let player_id = claims.player_id;

    info!(room_id = %room_id, player_id = %player_id, "Establishing websocket connection");
    Ok(ws.on_upgrade(move |socket| async move {
        let connection = Connection::new(player_id.clone(), room_id.clone(), Box::new(socket), events);
        match connection.run().await {
            Ok(()) => info!(room_id = %room_id, player_id = %player_id, "WebSocket connection closed cleanly"),
            Err(e) => warn!(room_id = %room_id, player_id = %player_id, error = ?e, "WebSocket connection error"),
        }
    }))
}
