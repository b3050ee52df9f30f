use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::event::EventBus;
use crate::game::{GameError, GameRepository, GameService};
use crate::room::{RoomRepository, RoomService};
use crate::session::TokenConfig;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub token_config: TokenConfig,
    pub event_bus: EventBus,
    pub room_service: Arc<RoomService>,
    pub game_service: Arc<GameService>,
}

impl AppState {
    /// Wires services over the given repositories; the event bus doubles as
    /// the notifier of both services.
    pub fn new(
        config: ServerConfig,
        token_config: TokenConfig,
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        game_repository: Arc<dyn GameRepository + Send + Sync>,
        event_bus: EventBus,
    ) -> Self {
        let notifier = Arc::new(event_bus.clone());
        let room_service = RoomService::new(
            Arc::clone(&room_repository),
            notifier.clone(),
            config.bounds_policy,
        );
        let game_service = GameService::new(room_repository, game_repository, notifier);

        Self {
            config: Arc::new(config),
            token_config,
            event_bus,
            room_service: Arc::new(room_service),
            game_service: Arc::new(game_service),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Machine-readable error code sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Game(e) => e.kind(),
            AppError::JwtError(_) => "jwt_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::DatabaseError(_) => "database_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Game(e) => match e {
                GameError::GameNotFound(_) | GameError::TileNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                GameError::NotInRoom => StatusCode::FORBIDDEN,
                GameError::OutOfBounds { .. } | GameError::InvalidLetter(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::CONFLICT,
            },
            AppError::JwtError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::DatabaseError(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_status_mapping() {
        let cases = [
            (AppError::from(GameError::RackNotEmpty), StatusCode::CONFLICT),
            (
                AppError::from(GameError::OutOfBounds { x: 9, y: 0 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::from(GameError::NotInRoom), StatusCode::FORBIDDEN),
            (
                AppError::from(GameError::GameNotFound("r".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{}", error);
        }
    }

    #[tokio::test]
    async fn test_error_body_has_kind() {
        let response = AppError::from(GameError::InsufficientTiles {
            requested: 4,
            remaining: 1,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "insufficient_tiles");
        assert!(json["error"].as_str().unwrap().contains("remaining 1"));
    }
}
