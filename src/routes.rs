use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::game::handlers as game;
use crate::room;
use crate::session;
use crate::shared::AppState;
use crate::websockets;

/// Full HTTP surface of the server
pub fn app_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/rooms", post(room::create_room).get(room::list_rooms))
        .route("/rooms/:room_id", get(room::get_room))
        .route("/rooms/:room_id/join", post(room::join_room))
        .route("/rooms/:room_id/start", post(game::start_game))
        .route("/rooms/:room_id/state", get(game::get_state))
        .route("/rooms/:room_id/bag", get(game::bag_count))
        .route("/rooms/:room_id/tiles/place", post(game::place_tile))
        .route("/rooms/:room_id/tiles/move", post(game::move_tile))
        .route("/rooms/:room_id/tiles/return", post(game::return_tile))
        .route("/rooms/:room_id/tiles/lock", post(game::lock_tile))
        .route("/rooms/:room_id/recall", post(game::recall_tiles))
        .route("/rooms/:room_id/mixmo", post(game::request_mixmo))
        .route("/rooms/:room_id/expand/:direction", post(game::expand_grid))
        .route("/rooms/:room_id/words", get(game::room_words))
        .route("/rooms/:room_id/events", get(game::room_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::jwt_auth,
        ));

    Router::new()
        .route("/", get(|| async { "mixmo" }))
        .route("/session", post(session::create_session))
        .route("/words", post(game::extract_words))
        // authenticates with a query token instead of a header
        .route("/rooms/:room_id/ws", get(websockets::websocket_handler))
        .merge(authenticated)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
