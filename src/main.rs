use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mixmo::event::EventBus;
use mixmo::game::{GameRepository, InMemoryGameRepository, PostgresGameRepository};
use mixmo::room::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository};
use mixmo::session::TokenConfig;
use mixmo::{app_router, AppState, ServerConfig};

type Repositories = (
    Arc<dyn RoomRepository + Send + Sync>,
    Arc<dyn GameRepository + Send + Sync>,
);

async fn repositories(config: &ServerConfig) -> Result<Repositories, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL storage");
            Ok((
                Arc::new(PostgresRoomRepository::new(pool.clone())),
                Arc::new(PostgresGameRepository::new(pool)),
            ))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            Ok((
                Arc::new(InMemoryRoomRepository::new()),
                Arc::new(InMemoryGameRepository::new()),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixmo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mixmo game server");

    let config = ServerConfig::from_env()?;
    info!(bounds_policy = %config.bounds_policy, "Configuration loaded");

    let (room_repository, game_repository) = repositories(&config).await?;
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(
        config,
        TokenConfig::from_env(),
        room_repository,
        game_repository,
        EventBus::new(),
    );
    let app = app_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
