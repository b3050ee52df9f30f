use chrono::Utc;
use std::sync::Arc;

use mixmo::{
    game::{Bag, BoundsPolicy, GameRepository, GameService, GameSession, InMemoryGameRepository},
    room::{
        models::{RoomModel, RoomState},
        repository::{InMemoryRoomRepository, RoomRepository, TransitionResult},
    },
};

use super::mocks::RecordingNotifier;

pub const ROOM_ID: &str = "room-1";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub games: Arc<InMemoryGameRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<GameService>,
    pub room_id: String,
}

#[allow(dead_code)]
impl TestSetup {
    /// Current tile state straight from the repository
    pub async fn session(&self) -> GameSession {
        self.games
            .get_game(&self.room_id)
            .await
            .unwrap()
            .expect("game session should exist")
    }

    pub async fn room_state(&self) -> RoomState {
        self.rooms
            .get_room(&self.room_id)
            .await
            .unwrap()
            .expect("room should exist")
            .state
    }

    /// Seqs in the player's rack, in rack order
    pub async fn rack_seqs(&self, player_id: &str) -> Vec<u32> {
        self.session()
            .await
            .rack(player_id)
            .into_iter()
            .map(|tile| tile.seq)
            .collect()
    }
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    policy: BoundsPolicy,
    bag_letters: Option<String>,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![ALICE.to_string(), BOB.to_string()],
            policy: BoundsPolicy::default(),
            bag_letters: None,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_policy(mut self, policy: BoundsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts the game on a bag holding exactly these letters. The first
    /// player is dealt the first six, the second player the next six.
    pub fn with_bag(mut self, letters: &str) -> Self {
        self.bag_letters = Some(letters.to_string());
        self
    }

    pub async fn build(self) -> TestSetup {
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let games = Arc::new(InMemoryGameRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let owner = self.players.first().cloned().unwrap_or_else(|| ALICE.to_string());
        let room = RoomModel::with_id(ROOM_ID.to_string(), owner, self.policy);
        rooms.create_room(&room).await.unwrap();
        for player in self.players.iter().skip(1) {
            rooms.try_join_room(ROOM_ID, player).await.unwrap();
        }

        if let Some(letters) = &self.bag_letters {
            let letters: Vec<char> = letters.chars().collect();
            let session = GameSession::start_with_bag(
                ROOM_ID,
                &self.players,
                self.policy,
                Bag::from_letters(&letters),
                Utc::now(),
            )
            .unwrap();
            games.save_game(&session, &[]).await.unwrap();
            let transition = rooms
                .transition_state(ROOM_ID, RoomState::Waiting, RoomState::Active)
                .await
                .unwrap();
            assert!(matches!(transition, TransitionResult::Success(_)));
        }

        let service = Arc::new(GameService::new(
            rooms.clone(),
            games.clone(),
            notifier.clone(),
        ));

        TestSetup {
            rooms,
            games,
            notifier,
            service,
            room_id: ROOM_ID.to_string(),
        }
    }
}
