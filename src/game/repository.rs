use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{GameEventKind, GameEventRecord};
use super::state::GameSession;
use crate::shared::AppError;

/// Storage for game sessions and their event log
#[async_trait]
pub trait GameRepository {
    async fn get_game(&self, room_id: &str) -> Result<Option<GameSession>, AppError>;

    /// Stores the session and appends its events as one commit
    async fn save_game(
        &self,
        session: &GameSession,
        events: &[GameEventRecord],
    ) -> Result<(), AppError>;

    /// Event log of a room, oldest first
    async fn list_events(&self, room_id: &str) -> Result<Vec<GameEventRecord>, AppError>;
}

#[derive(Default)]
struct GameStore {
    games: HashMap<String, GameSession>,
    events: Vec<GameEventRecord>,
}

/// In-memory implementation of GameRepository for development and testing
#[derive(Default)]
pub struct InMemoryGameRepository {
    store: Mutex<GameStore>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games
    pub fn game_count(&self) -> usize {
        self.store.lock().map(|store| store.games.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    #[instrument(skip(self))]
    async fn get_game(&self, room_id: &str) -> Result<Option<GameSession>, AppError> {
        let store = self.store.lock().map_err(|_| AppError::Internal)?;
        let game = store.games.get(room_id).cloned();
        debug!(room_id = %room_id, found = game.is_some(), "Fetched game from memory");
        Ok(game)
    }

    #[instrument(skip(self, session, events), fields(room_id = %session.room_id()))]
    async fn save_game(
        &self,
        session: &GameSession,
        events: &[GameEventRecord],
    ) -> Result<(), AppError> {
        let mut store = self.store.lock().map_err(|_| AppError::Internal)?;
        store
            .games
            .insert(session.room_id().to_string(), session.clone());
        store.events.extend_from_slice(events);

        debug!(event_count = events.len(), "Game saved in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_events(&self, room_id: &str) -> Result<Vec<GameEventRecord>, AppError> {
        let store = self.store.lock().map_err(|_| AppError::Internal)?;
        Ok(store
            .events
            .iter()
            .filter(|event| event.room_id == room_id)
            .cloned()
            .collect())
    }
}

/// PostgreSQL implementation of game repository
pub struct PostgresGameRepository {
    pool: PgPool,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Game database operation failed");
    AppError::DatabaseError(e.to_string())
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    #[instrument(skip(self))]
    async fn get_game(&self, room_id: &str) -> Result<Option<GameSession>, AppError> {
        let row = sqlx::query("SELECT state FROM game_sessions WHERE room_id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        match row {
            Some(row) => {
                let Json(session): Json<GameSession> =
                    row.try_get("state").map_err(database_error)?;
                Ok(Some(session))
            }
            None => {
                debug!(room_id = %room_id, "Game not found in database");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, session, events), fields(room_id = %session.room_id()))]
    async fn save_game(
        &self,
        session: &GameSession,
        events: &[GameEventRecord],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            "INSERT INTO game_sessions (room_id, state, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (room_id) DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at",
        )
        .bind(session.room_id())
        .bind(Json(session))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        for event in events {
            sqlx::query(
                "INSERT INTO game_events (id, room_id, player_id, kind, payload, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&event.id)
            .bind(&event.room_id)
            .bind(&event.player_id)
            .bind(event.kind.to_string())
            .bind(Json(&event.payload))
            .bind(event.created_at)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        }

        tx.commit().await.map_err(database_error)?;
        debug!(event_count = events.len(), "Game saved in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_events(&self, room_id: &str) -> Result<Vec<GameEventRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, room_id, player_id, kind, payload, created_at FROM game_events \
             WHERE room_id = $1 ORDER BY created_at, seq",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter()
            .map(|row| {
                let kind: String = row.try_get("kind").map_err(database_error)?;
                let kind = GameEventKind::from_str(&kind).map_err(|e| {
                    warn!(kind = %kind, error = %e, "Unknown event kind in database");
                    AppError::DatabaseError(format!("unknown event kind: {}", kind))
                })?;
                let Json(payload): Json<serde_json::Value> =
                    row.try_get("payload").map_err(database_error)?;
                let created_at: DateTime<Utc> =
                    row.try_get("created_at").map_err(database_error)?;

                Ok(GameEventRecord {
                    id: row.try_get("id").map_err(database_error)?,
                    room_id: row.try_get("room_id").map_err(database_error)?,
                    player_id: row.try_get("player_id").map_err(database_error)?,
                    kind,
                    payload,
                    created_at,
                })
            })
            .collect()
    }
}
