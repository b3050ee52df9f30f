use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    board::{ExpandDirection, GridBounds, Placement},
    errors::GameError,
    exchange::{self, MixmoOutcome},
    locks::RoomLocks,
    models::{GameEventKind, GameEventRecord},
    repository::GameRepository,
    state::{BoardTile, GameSession, RackTile},
    tiles::TileSeq,
    types::{OpponentView, PlayerView},
    words::{extract, PlacedLetter, Word},
};
use crate::event::{GameNotifier, TableCategory};
use crate::room::models::{RoomModel, RoomState, MAX_PLAYERS};
use crate::room::repository::{RoomRepository, TransitionResult};
use crate::shared::AppError;

const ALL_CATEGORIES: &[TableCategory] = &[
    TableCategory::Rack,
    TableCategory::Board,
    TableCategory::Bag,
    TableCategory::Room,
    TableCategory::Players,
];

/// A mutation applied to a working copy of the session. An empty event list
/// means nothing changed: nothing is saved and nobody is notified.
struct Change<T> {
    value: T,
    events: Vec<GameEventRecord>,
    categories: &'static [TableCategory],
    /// Whether the mutation can end the game
    may_finish: bool,
}

impl<T> Change<T> {
    fn none(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
            categories: &[],
            may_finish: false,
        }
    }
}

/// Result of a committed mutation, read while the room was still locked
struct Applied<T> {
    value: T,
    session: GameSession,
    state: RoomState,
    categories: Vec<TableCategory>,
}

/// Entry point of the game engine.
///
/// Every mutation runs under the room's lock: load the room and its session,
/// validate and mutate a copy, commit, release the lock, then notify once.
pub struct GameService {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    games: Arc<dyn GameRepository + Send + Sync>,
    notifier: Arc<dyn GameNotifier>,
    locks: RoomLocks,
}

impl GameService {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        games: Arc<dyn GameRepository + Send + Sync>,
        notifier: Arc<dyn GameNotifier>,
    ) -> Self {
        Self {
            rooms,
            games,
            notifier,
            locks: RoomLocks::new(),
        }
    }

    /// Starts a waiting room: builds its bag and deals six tiles to each player
    #[instrument(skip(self))]
    pub async fn start_game(&self, room_id: &str, requester_id: &str) -> Result<PlayerView, AppError> {
        let guard = self.locks.acquire(room_id).await;
        let result = self.start_locked(room_id, requester_id).await;
        drop(guard);

        match result {
            Ok(view) => {
                self.notifier.notify(room_id, ALL_CATEGORIES).await;
                Ok(view)
            }
            Err(e) => {
                warn!(room_id = %room_id, player_id = %requester_id, kind = e.kind(), error = %e, "start_game rejected");
                Err(e)
            }
        }
    }

    async fn start_locked(&self, room_id: &str, requester_id: &str) -> Result<PlayerView, AppError> {
        let room = self.find_room(room_id).await?;

        if !room.is_owner(requester_id) {
            return Err(GameError::InvalidStartPrecondition(
                "only the room owner can start the game".to_string(),
            )
            .into());
        }
        if room.state != RoomState::Waiting {
            return Err(GameError::InvalidStartPrecondition(format!(
                "room is {}",
                room.state
            ))
            .into());
        }
        if room.player_count() != MAX_PLAYERS {
            return Err(GameError::InvalidStartPrecondition(format!(
                "{} players seated, {} required",
                room.player_count(),
                MAX_PLAYERS
            ))
            .into());
        }

        let now = Utc::now();
        let session = GameSession::start(&room.id, &room.player_ids, room.bounds_policy, now)?;
        let start = GameEventRecord::start(&room.id, requester_id, &room.player_ids, now);

        self.commit_transition(&session, &[start], RoomState::Waiting, RoomState::Active)
            .await
            .map_err(|e| match e {
                AppError::Game(GameError::GameNotActive) => AppError::Game(
                    GameError::InvalidStartPrecondition("room is no longer waiting".to_string()),
                ),
                other => other,
            })?;

        info!(
            room_id = %room_id,
            players = ?room.player_ids,
            bag_remaining = session.bag_count(),
            "Game started"
        );

        Ok(build_view(&session, RoomState::Active, requester_id))
    }

    /// Moves a tile from the player's rack onto their board
    #[instrument(skip(self, as_letter))]
    pub async fn place_tile(
        &self,
        room_id: &str,
        player_id: &str,
        seq: TileSeq,
        x: i32,
        y: i32,
        as_letter: Option<&str>,
    ) -> Result<PlayerView, AppError> {
        let as_letter = as_letter.map(str::to_string);
        let applied = self
            .apply(room_id, player_id, "place_tile", move |session, now| {
                match session.place_tile(player_id, seq, x, y, as_letter.as_deref())? {
                    Placement::Unchanged => Ok(Change::none(())),
                    Placement::Placed => Ok(Change {
                        value: (),
                        events: vec![GameEventRecord::new(
                            room_id,
                            player_id,
                            GameEventKind::Place,
                            serde_json::json!({ "tile": seq, "x": x, "y": y }),
                            now,
                        )],
                        categories: &[TableCategory::Rack, TableCategory::Board],
                        may_finish: true,
                    }),
                }
            })
            .await?;

        Ok(build_view(&applied.session, applied.state, player_id))
    }

    #[instrument(skip(self))]
    pub async fn move_tile(
        &self,
        room_id: &str,
        player_id: &str,
        seq: TileSeq,
        x: i32,
        y: i32,
    ) -> Result<PlayerView, AppError> {
        let applied = self
            .apply(room_id, player_id, "move_tile", move |session, now| {
                match session.move_tile(player_id, seq, x, y)? {
                    Placement::Unchanged => Ok(Change::none(())),
                    Placement::Placed => Ok(Change {
                        value: (),
                        events: vec![GameEventRecord::new(
                            room_id,
                            player_id,
                            GameEventKind::Move,
                            serde_json::json!({ "tile": seq, "x": x, "y": y }),
                            now,
                        )],
                        categories: &[TableCategory::Board],
                        may_finish: true,
                    }),
                }
            })
            .await?;

        Ok(build_view(&applied.session, applied.state, player_id))
    }

    /// Sends one unlocked board tile back to the end of the rack
    #[instrument(skip(self))]
    pub async fn return_tile(
        &self,
        room_id: &str,
        player_id: &str,
        seq: TileSeq,
    ) -> Result<PlayerView, AppError> {
        let applied = self
            .apply(room_id, player_id, "return_tile", move |session, now| {
                session.return_tile(player_id, seq)?;
                Ok(Change {
                    value: (),
                    events: vec![GameEventRecord::tiles(
                        room_id,
                        player_id,
                        GameEventKind::Return,
                        &[seq],
                        now,
                    )],
                    categories: &[TableCategory::Rack, TableCategory::Board],
                    may_finish: false,
                })
            })
            .await?;

        Ok(build_view(&applied.session, applied.state, player_id))
    }

    /// Sends every unlocked board tile back to the rack, in placement order
    #[instrument(skip(self))]
    pub async fn recall_tiles(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<(Vec<TileSeq>, PlayerView), AppError> {
        let applied = self
            .apply(room_id, player_id, "recall_tiles", move |session, now| {
                let recalled = session.recall_tiles(player_id)?;
                if recalled.is_empty() {
                    return Ok(Change::none(recalled));
                }
                let event = GameEventRecord::tiles(
                    room_id,
                    player_id,
                    GameEventKind::Recall,
                    &recalled,
                    now,
                );
                Ok(Change {
                    value: recalled,
                    events: vec![event],
                    categories: &[TableCategory::Rack, TableCategory::Board],
                    may_finish: false,
                })
            })
            .await?;

        let view = build_view(&applied.session, applied.state, player_id);
        Ok((applied.value, view))
    }

    /// Makes a board tile immovable
    #[instrument(skip(self))]
    pub async fn lock_tile(
        &self,
        room_id: &str,
        player_id: &str,
        seq: TileSeq,
    ) -> Result<PlayerView, AppError> {
        let applied = self
            .apply(room_id, player_id, "lock_tile", move |session, now| {
                session.lock_tile(player_id, seq)?;
                Ok(Change {
                    value: (),
                    events: vec![GameEventRecord::tiles(
                        room_id,
                        player_id,
                        GameEventKind::Lock,
                        &[seq],
                        now,
                    )],
                    categories: &[TableCategory::Board],
                    may_finish: false,
                })
            })
            .await?;

        Ok(build_view(&applied.session, applied.state, player_id))
    }

    /// Pushes one edge of the player's grid outward (dynamic rooms only)
    #[instrument(skip(self))]
    pub async fn expand_grid(
        &self,
        room_id: &str,
        player_id: &str,
        direction: ExpandDirection,
    ) -> Result<GridBounds, AppError> {
        let applied = self
            .apply(room_id, player_id, "expand_grid", move |session, now| {
                let bounds = session.expand_grid(player_id, direction)?;
                Ok(Change {
                    value: bounds,
                    events: vec![GameEventRecord::new(
                        room_id,
                        player_id,
                        GameEventKind::Expand,
                        serde_json::json!({ "direction": direction, "bounds": bounds }),
                        now,
                    )],
                    categories: &[TableCategory::Board],
                    may_finish: false,
                })
            })
            .await?;

        Ok(applied.value)
    }

    /// Drains four tiles from the bag, two to each rack. The requester's rack must be empty.
    #[instrument(skip(self))]
    pub async fn request_mixmo(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<MixmoOutcome, AppError> {
        let applied = self
            .apply(room_id, player_id, "request_mixmo", move |session, now| {
                let outcome = exchange::execute(session, player_id, now)?;
                let event = GameEventRecord::mixmo(room_id, &outcome, now);
                Ok(Change {
                    value: outcome,
                    events: vec![event],
                    categories: &[TableCategory::Rack, TableCategory::Bag],
                    may_finish: true,
                })
            })
            .await?;

        info!(
            room_id = %room_id,
            requester = %player_id,
            drawn = ?applied.value.drawn,
            to_requester = ?applied.value.to_requester,
            to_other = ?applied.value.to_other,
            bag_remaining = applied.session.bag_count(),
            "MIXMO"
        );
        Ok(applied.value)
    }

    /// Words currently formed on the player's board
    #[instrument(skip(self))]
    pub async fn words(&self, room_id: &str, player_id: &str) -> Result<Vec<Word>, AppError> {
        let (_, session) = self.load_seated(room_id, player_id).await?;
        Ok(session.words(player_id))
    }

    /// Words formed by an arbitrary board snapshot
    pub fn extract_words(tiles: &[PlacedLetter]) -> Vec<Word> {
        extract(tiles)
    }

    #[instrument(skip(self))]
    pub async fn bag_count(&self, room_id: &str) -> Result<usize, AppError> {
        let session = self.find_game(room_id).await?;
        Ok(session.bag_count())
    }

    #[instrument(skip(self))]
    pub async fn rack_snapshot(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Vec<RackTile>, AppError> {
        let (_, session) = self.load_seated(room_id, player_id).await?;
        Ok(session.rack(player_id))
    }

    #[instrument(skip(self))]
    pub async fn board_snapshot(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Vec<BoardTile>, AppError> {
        let (_, session) = self.load_seated(room_id, player_id).await?;
        Ok(session.board(player_id))
    }

    #[instrument(skip(self))]
    pub async fn player_view(&self, room_id: &str, player_id: &str) -> Result<PlayerView, AppError> {
        let (room, session) = self.load_seated(room_id, player_id).await?;
        Ok(build_view(&session, room.state, player_id))
    }

    /// Audit log of a room, oldest first
    #[instrument(skip(self))]
    pub async fn events(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Vec<GameEventRecord>, AppError> {
        let room = self.find_room(room_id).await?;
        if !room.has_player(player_id) {
            return Err(GameError::NotInRoom.into());
        }
        self.games.list_events(room_id).await
    }

    /// Runs one mutation under the room lock and notifies after releasing it
    async fn apply<T, F>(
        &self,
        room_id: &str,
        player_id: &str,
        operation: &'static str,
        mutation: F,
    ) -> Result<Applied<T>, AppError>
    where
        T: Send,
        F: FnOnce(&mut GameSession, DateTime<Utc>) -> Result<Change<T>, GameError> + Send,
    {
        let guard = self.locks.acquire(room_id).await;
        let result = self.apply_locked(room_id, player_id, mutation).await;
        drop(guard);

        match result {
            Ok(applied) => {
                if !applied.categories.is_empty() {
                    self.notifier.notify(room_id, &applied.categories).await;
                }
                Ok(applied)
            }
            Err(e) => {
                warn!(
                    room_id = %room_id,
                    player_id = %player_id,
                    operation = operation,
                    kind = e.kind(),
                    error = %e,
                    "Operation rejected"
                );
                Err(e)
            }
        }
    }

    async fn apply_locked<T, F>(
        &self,
        room_id: &str,
        player_id: &str,
        mutation: F,
    ) -> Result<Applied<T>, AppError>
    where
        F: FnOnce(&mut GameSession, DateTime<Utc>) -> Result<Change<T>, GameError>,
    {
        let (_, mut session) = self.load_active(room_id, player_id).await?;
        let now = Utc::now();

        let change = mutation(&mut session, now)?;
        if change.events.is_empty() {
            debug!(room_id = %room_id, player_id = %player_id, "Nothing changed");
            return Ok(Applied {
                value: change.value,
                session,
                state: RoomState::Active,
                categories: Vec::new(),
            });
        }

        let mut events = change.events;
        let mut categories = change.categories.to_vec();
        let finished = change.may_finish && session.is_finished_by(player_id);
        if finished {
            events.push(GameEventRecord::finish(
                room_id,
                player_id,
                session.bag_count(),
                now,
            ));
            categories.push(TableCategory::Room);
        }

        let state = if finished {
            self.commit_transition(&session, &events, RoomState::Active, RoomState::Finished)
                .await?;
            info!(room_id = %room_id, finished_by = %player_id, "Game finished");
            RoomState::Finished
        } else {
            self.games.save_game(&session, &events).await?;
            RoomState::Active
        };

        debug!(
            room_id = %room_id,
            player_id = %player_id,
            events = ?events.iter().map(|e| e.kind).collect::<Vec<_>>(),
            "Mutation committed"
        );

        Ok(Applied {
            value: change.value,
            session,
            state,
            categories,
        })
    }

    /// Saves the session and its events together with a room state change.
    ///
    /// The compare-and-set runs first so a lost race stores nothing; a failed
    /// save moves the room back to `from` before the error is returned.
    async fn commit_transition(
        &self,
        session: &GameSession,
        events: &[GameEventRecord],
        from: RoomState,
        to: RoomState,
    ) -> Result<(), AppError> {
        let room_id = session.room_id();
        self.transition(room_id, from, to).await?;

        if let Err(e) = self.games.save_game(session, events).await {
            warn!(room_id = %room_id, from = %from, to = %to, error = %e, "Save failed, rolling back room state");
            if let Err(rollback) = self.transition(room_id, to, from).await {
                error!(room_id = %room_id, error = %rollback, "Room state rollback failed");
            }
            return Err(e);
        }
        Ok(())
    }

    async fn transition(&self, room_id: &str, from: RoomState, to: RoomState) -> Result<(), AppError> {
        match self.rooms.transition_state(room_id, from, to).await? {
            TransitionResult::Success(_) => Ok(()),
            TransitionResult::StateMismatch(actual) => {
                warn!(room_id = %room_id, expected = %from, actual = %actual, "Room state changed underneath");
                Err(GameError::GameNotActive.into())
            }
            TransitionResult::RoomNotFound => {
                Err(AppError::NotFound(format!("Room not found: {}", room_id)))
            }
        }
    }

    async fn find_room(&self, room_id: &str) -> Result<RoomModel, AppError> {
        self.rooms
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room not found: {}", room_id)))
    }

    async fn find_game(&self, room_id: &str) -> Result<GameSession, AppError> {
        self.games
            .get_game(room_id)
            .await?
            .ok_or_else(|| GameError::GameNotFound(room_id.to_string()).into())
    }

    /// Room and session for a seated player, whatever the room state
    async fn load_seated(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<(RoomModel, GameSession), AppError> {
        let room = self.find_room(room_id).await?;
        if !room.has_player(player_id) {
            return Err(GameError::NotInRoom.into());
        }
        let session = self.find_game(room_id).await?;
        Ok((room, session))
    }

    /// Room and session for a mutation: active room, two seats, caller seated
    async fn load_active(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<(RoomModel, GameSession), AppError> {
        let room = self.find_room(room_id).await?;
        if room.state != RoomState::Active {
            return Err(GameError::GameNotActive.into());
        }
        if room.player_count() != MAX_PLAYERS {
            return Err(GameError::WrongPlayerCount {
                count: room.player_count(),
            }
            .into());
        }
        if !room.has_player(player_id) {
            return Err(GameError::NotInRoom.into());
        }
        let session = self.find_game(room_id).await?;
        Ok((room, session))
    }
}

fn build_view(session: &GameSession, state: RoomState, player_id: &str) -> PlayerView {
    let opponent = session.opponent_of(player_id).ok().map(|other| OpponentView {
        player_id: other.clone(),
        rack_count: session.rack_count(other),
        board_count: session.board_count(other),
    });

    PlayerView {
        room_id: session.room_id().to_string(),
        player_id: player_id.to_string(),
        state,
        rack: session.rack(player_id),
        board: session.board(player_id),
        bounds: session.bounds(player_id),
        bag_count: session.bag_count(),
        mixmo_enabled: state == RoomState::Active && session.mixmo_enabled(player_id),
        opponent,
    }
}
