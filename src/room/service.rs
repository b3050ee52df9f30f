use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::RoomModel,
    repository::{JoinRoomResult, RoomRepository},
    types::{RoomCreateRequest, RoomResponse},
};
use crate::event::{GameNotifier, TableCategory};
use crate::game::BoundsPolicy;
use crate::shared::AppError;

/// Service for the room lobby: creating, listing and joining rooms
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    notifier: Arc<dyn GameNotifier>,
    default_policy: BoundsPolicy,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        notifier: Arc<dyn GameNotifier>,
        default_policy: BoundsPolicy,
    ) -> Self {
        Self {
            repository,
            notifier,
            default_policy,
        }
    }

    /// Creates a waiting room owned by `owner_id`, optionally seating an invited opponent
    #[instrument(skip(self, request))]
    pub async fn create_room(
        &self,
        owner_id: &str,
        request: RoomCreateRequest,
    ) -> Result<RoomResponse, AppError> {
        let policy = request.bounds_policy.unwrap_or(self.default_policy);
        policy.validate().map_err(|reason| {
            warn!(owner_id = %owner_id, policy = %policy, reason = %reason, "Rejecting room bounds policy");
            AppError::BadRequest(reason)
        })?;

        let mut room = RoomModel::new(owner_id.to_string(), policy);
        if let Some(opponent_id) = request.opponent_id {
            let opponent_id = opponent_id.trim().to_string();
            if opponent_id.is_empty() || opponent_id == owner_id {
                return Err(AppError::BadRequest(
                    "Opponent must be another player".to_string(),
                ));
            }
            room.player_ids.push(opponent_id);
        }
        debug!(room_id = %room.id, "Generated room ID");

        self.repository.create_room(&room).await?;

        info!(
            room_id = %room.id,
            owner_id = %owner_id,
            bounds_policy = %room.bounds_policy,
            player_count = room.player_count(),
            "Room created"
        );

        Ok(room.into())
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<RoomResponse, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .map(RoomResponse::from)
            .ok_or_else(|| AppError::NotFound(format!("Room not found: {}", room_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomResponse>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        debug!(room_count = rooms.len(), "Rooms retrieved");
        Ok(rooms.into_iter().map(RoomResponse::from).collect())
    }

    /// Takes a free seat in a waiting room
    #[instrument(skip(self))]
    pub async fn join_room(&self, room_id: &str, player_id: &str) -> Result<RoomResponse, AppError> {
        let (room, was_seated) = match self.repository.get_room(room_id).await? {
            Some(room) => {
                let seated = room.has_player(player_id);
                (room, seated)
            }
            None => return Err(AppError::NotFound(format!("Room not found: {}", room_id))),
        };
        if was_seated {
            debug!(room_id = %room_id, player_id = %player_id, "Player already seated");
            return Ok(room.into());
        }

        match self.repository.try_join_room(room_id, player_id).await? {
            JoinRoomResult::Success(room) => {
                info!(
                    room_id = %room_id,
                    player_id = %player_id,
                    player_count = room.player_count(),
                    "Player joined room"
                );
                self.notifier
                    .notify(room_id, &[TableCategory::Players, TableCategory::Room])
                    .await;
                Ok(room.into())
            }
            JoinRoomResult::RoomFull => {
                warn!(room_id = %room_id, player_id = %player_id, "Join rejected: room is full");
                Err(AppError::Conflict("Room is full".to_string()))
            }
            JoinRoomResult::NotWaiting(state) => {
                warn!(room_id = %room_id, state = %state, "Join rejected: room is not waiting");
                Err(AppError::Conflict(format!("Room is {}", state)))
            }
            JoinRoomResult::RoomNotFound => {
                Err(AppError::NotFound(format!("Room not found: {}", room_id)))
            }
        }
    }
}
