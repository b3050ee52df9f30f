use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{RoomModel, RoomState};
use crate::game::BoundsPolicy;
use crate::shared::AppError;

/// Result of attempting to join a room
#[derive(Debug, Clone, PartialEq)]
pub enum JoinRoomResult {
    /// Seated (or already seated), returns updated room data
    Success(RoomModel),
    /// Both seats are taken
    RoomFull,
    /// The game already started or ended
    NotWaiting(RoomState),
    /// Room does not exist
    RoomNotFound,
}

/// Result of a compare-and-set on a room's state
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    Success(RoomModel),
    /// The room was not in the expected state; carries the actual one
    StateMismatch(RoomState),
    RoomNotFound,
}

/// Trait for room repository operations
#[async_trait]
pub trait RoomRepository {
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Atomically claims a free seat, so two joiners can never both take the last one
    async fn try_join_room(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<JoinRoomResult, AppError>;

    /// Moves the room from `from` to `to` only if it is still in `from`
    async fn transition_state(
        &self,
        room_id: &str,
        from: RoomState,
        to: RoomState,
    ) -> Result<TransitionResult, AppError>;
}

/// In-memory implementation of RoomRepository for development and testing
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        debug!(room_id = %room.id, owner_id = %room.owner_id, "Creating room in memory");

        let mut rooms = self.rooms.lock().map_err(|_| AppError::Internal)?;
        if rooms.contains_key(&room.id) {
            warn!(room_id = %room.id, "Room already exists in memory");
            return Err(AppError::DatabaseError("Room already exists".to_string()));
        }
        rooms.insert(room.id.clone(), room.clone());

        debug!(room_id = %room.id, "Room created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.lock().map_err(|_| AppError::Internal)?;
        let room = rooms.get(room_id).cloned();

        match &room {
            Some(r) => debug!(room_id = %room_id, state = %r.state, "Room found in memory"),
            None => debug!(room_id = %room_id, "Room not found in memory"),
        }

        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let rooms = self.rooms.lock().map_err(|_| AppError::Internal)?;
        let mut room_list: Vec<RoomModel> = rooms.values().cloned().collect();
        room_list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        debug!(room_count = room_list.len(), "Rooms listed from memory");
        Ok(room_list)
    }

    #[instrument(skip(self))]
    async fn try_join_room(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<JoinRoomResult, AppError> {
        let mut rooms = self.rooms.lock().map_err(|_| AppError::Internal)?;

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room not found");
                return Ok(JoinRoomResult::RoomNotFound);
            }
        };

        // Rejoining is a no-op, even after the game started
        if room.has_player(player_id) {
            debug!(room_id = %room_id, player_id = %player_id, "Player already in room");
            return Ok(JoinRoomResult::Success(room.clone()));
        }

        if room.state != RoomState::Waiting {
            return Ok(JoinRoomResult::NotWaiting(room.state));
        }

        if room.is_full() {
            debug!(room_id = %room_id, player_count = room.player_count(), "Room is full");
            return Ok(JoinRoomResult::RoomFull);
        }

        room.player_ids.push(player_id.to_string());

        info!(
            room_id = %room_id,
            player_id = %player_id,
            new_player_count = room.player_count(),
            "Player joined room"
        );

        Ok(JoinRoomResult::Success(room.clone()))
    }

    #[instrument(skip(self))]
    async fn transition_state(
        &self,
        room_id: &str,
        from: RoomState,
        to: RoomState,
    ) -> Result<TransitionResult, AppError> {
        let mut rooms = self.rooms.lock().map_err(|_| AppError::Internal)?;

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => return Ok(TransitionResult::RoomNotFound),
        };

        if room.state != from {
            debug!(room_id = %room_id, actual = %room.state, expected = %from, "Room state mismatch");
            return Ok(TransitionResult::StateMismatch(room.state));
        }

        room.state = to;
        info!(room_id = %room_id, from = %from, to = %to, "Room state changed");
        Ok(TransitionResult::Success(room.clone()))
    }
}

/// PostgreSQL implementation of room repository
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROOM_COLUMNS: &str = "id, owner_id, state, player_ids, bounds_policy, created_at";

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Room database operation failed");
    AppError::DatabaseError(e.to_string())
}

fn room_from_row(row: &PgRow) -> Result<RoomModel, AppError> {
    let state: String = row.try_get("state").map_err(database_error)?;
    let state = RoomState::from_str(&state)
        .map_err(|_| AppError::DatabaseError(format!("unknown room state: {}", state)))?;
    let Json(bounds_policy): Json<BoundsPolicy> =
        row.try_get("bounds_policy").map_err(database_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(database_error)?;

    Ok(RoomModel {
        id: row.try_get("id").map_err(database_error)?,
        owner_id: row.try_get("owner_id").map_err(database_error)?,
        state,
        player_ids: row.try_get("player_ids").map_err(database_error)?,
        bounds_policy,
        created_at,
    })
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        debug!(room_id = %room.id, owner_id = %room.owner_id, "Creating room in database");

        sqlx::query(
            "INSERT INTO rooms (id, owner_id, state, player_ids, bounds_policy, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&room.id)
        .bind(&room.owner_id)
        .bind(room.state.to_string())
        .bind(&room.player_ids)
        .bind(Json(room.bounds_policy))
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM rooms WHERE id = $1", ROOM_COLUMNS))
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(room_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rooms ORDER BY created_at, id",
            ROOM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(room_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn try_join_room(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<JoinRoomResult, AppError> {
        // The guarded UPDATE is the atomic seat claim
        let row = sqlx::query(&format!(
            "UPDATE rooms SET player_ids = array_append(player_ids, $2) \
             WHERE id = $1 AND state = 'waiting' AND cardinality(player_ids) < $3 \
             AND NOT ($2 = ANY(player_ids)) RETURNING {}",
            ROOM_COLUMNS
        ))
        .bind(room_id)
        .bind(player_id)
        .bind(super::models::MAX_PLAYERS as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        if let Some(row) = row {
            let room = room_from_row(&row)?;
            info!(room_id = %room_id, player_id = %player_id, "Player joined room");
            return Ok(JoinRoomResult::Success(room));
        }

        // Nothing updated: find out why
        let room = match self.get_room(room_id).await? {
            Some(room) => room,
            None => return Ok(JoinRoomResult::RoomNotFound),
        };
        if room.has_player(player_id) {
            Ok(JoinRoomResult::Success(room))
        } else if room.state != RoomState::Waiting {
            Ok(JoinRoomResult::NotWaiting(room.state))
        } else {
            Ok(JoinRoomResult::RoomFull)
        }
    }

    #[instrument(skip(self))]
    async fn transition_state(
        &self,
        room_id: &str,
        from: RoomState,
        to: RoomState,
    ) -> Result<TransitionResult, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE rooms SET state = $3 WHERE id = $1 AND state = $2 RETURNING {}",
            ROOM_COLUMNS
        ))
        .bind(room_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        if let Some(row) = row {
            info!(room_id = %room_id, from = %from, to = %to, "Room state changed");
            return Ok(TransitionResult::Success(room_from_row(&row)?));
        }

        match self.get_room(room_id).await? {
            Some(room) => Ok(TransitionResult::StateMismatch(room.state)),
            None => Ok(TransitionResult::RoomNotFound),
        }
    }
}
