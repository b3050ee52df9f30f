// GameSession is the tile state of one room: the bag, both racks and both boards.
// It is loaded, mutated and saved as a unit inside the room's lock, so every
// method here either applies fully or returns an error with nothing changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bag::Bag;
use super::board::{BoardState, BoundsPolicy, ExpandDirection, GridBounds, Placement};
use super::errors::GameError;
use super::rack::RackState;
use super::tiles::{resolve_face, PlayerId, Tile, TileSeq};
use super::words::{extract, Word};

/// Tiles dealt to each player when the game starts
pub const INITIAL_RACK_SIZE: usize = 6;

/// Tiles drained from the bag by one mixmo
pub const MIXMO_TILE_COUNT: usize = 4;

/// A rack slot joined with its tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackTile {
    pub idx: u32,
    pub seq: TileSeq,
    pub letter: char,
    pub is_joker: bool,
}

/// A board cell joined with its tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTile {
    pub seq: TileSeq,
    pub letter: char,
    pub is_joker: bool,
    pub as_letter: char,
    pub x: i32,
    pub y: i32,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    room_id: String,
    players: Vec<PlayerId>,
    bag: Bag,
    racks: RackState,
    boards: BoardState,
    created_at: DateTime<Utc>,
}

impl GameSession {
    /// Builds the room's bag and deals the opening racks, one tile at a time,
    /// player by player in seat order.
    pub fn start(
        room_id: &str,
        players: &[PlayerId],
        policy: BoundsPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        Self::start_with_bag(room_id, players, policy, Bag::create(room_id), now)
    }

    /// Same as [`GameSession::start`] but with a prepared bag
    pub fn start_with_bag(
        room_id: &str,
        players: &[PlayerId],
        policy: BoundsPolicy,
        bag: Bag,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        if players.len() != 2 {
            return Err(GameError::InvalidStartPrecondition(format!(
                "exactly 2 players are required, found {}",
                players.len()
            )));
        }
        if players[0] == players[1] {
            return Err(GameError::InvalidStartPrecondition(
                "players must be distinct".to_string(),
            ));
        }

        let mut session = Self {
            room_id: room_id.to_string(),
            players: players.to_vec(),
            bag,
            racks: RackState::new(),
            boards: BoardState::new(policy),
            created_at: now,
        };

        for player in players {
            for _ in 0..INITIAL_RACK_SIZE {
                let tile = session.bag.draw(1, player, now)?;
                let seqs: Vec<TileSeq> = tile.iter().map(|t| t.seq).collect();
                session.racks.draw(player, &seqs);
            }
        }

        Ok(session)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.boards.policy()
    }

    pub fn bag_count(&self) -> usize {
        self.bag.remaining_count()
    }

    pub fn ensure_player(&self, player_id: &str) -> Result<(), GameError> {
        if self.players.iter().any(|p| p == player_id) {
            Ok(())
        } else {
            Err(GameError::NotInRoom)
        }
    }

    pub fn opponent_of(&self, player_id: &str) -> Result<&PlayerId, GameError> {
        self.ensure_player(player_id)?;
        self.players
            .iter()
            .find(|p| p.as_str() != player_id)
            .ok_or(GameError::WrongPlayerCount {
                count: self.players.len(),
            })
    }

    /// Moves a tile from the player's rack onto their board
    pub fn place_tile(
        &mut self,
        player_id: &str,
        seq: TileSeq,
        x: i32,
        y: i32,
        as_letter: Option<&str>,
    ) -> Result<Placement, GameError> {
        self.ensure_player(player_id)?;
        let tile = self.tile(seq)?;

        if let Some(existing) = self.boards.entry(player_id, seq) {
            if existing.x == x && existing.y == y {
                return Ok(Placement::Unchanged);
            }
        }
        if !self.racks.contains(player_id, seq) {
            return Err(GameError::NotInRack { seq });
        }

        let face = resolve_face(&tile, as_letter)?;
        let placement = self.boards.place(player_id, seq, x, y, face)?;
        self.racks.remove(player_id, seq)?;
        Ok(placement)
    }

    pub fn move_tile(
        &mut self,
        player_id: &str,
        seq: TileSeq,
        x: i32,
        y: i32,
    ) -> Result<Placement, GameError> {
        self.ensure_player(player_id)?;
        self.boards.move_tile(player_id, seq, x, y)
    }

    /// Sends one unlocked board tile back to the end of the player's rack
    pub fn return_tile(&mut self, player_id: &str, seq: TileSeq) -> Result<u32, GameError> {
        self.ensure_player(player_id)?;
        let entry = self.boards.take(player_id, seq)?;
        let assigned = self.racks.draw(player_id, &[entry.tile_seq]);
        Ok(assigned[0])
    }

    /// Sends every unlocked board tile back to the rack, keeping placement order
    pub fn recall_tiles(&mut self, player_id: &str) -> Result<Vec<TileSeq>, GameError> {
        self.ensure_player(player_id)?;
        let recalled = self.boards.recall(player_id);
        self.racks.draw(player_id, &recalled);
        Ok(recalled)
    }

    pub fn lock_tile(&mut self, player_id: &str, seq: TileSeq) -> Result<(), GameError> {
        self.ensure_player(player_id)?;
        self.boards.lock(player_id, seq)
    }

    pub fn expand_grid(
        &mut self,
        player_id: &str,
        direction: ExpandDirection,
    ) -> Result<GridBounds, GameError> {
        self.ensure_player(player_id)?;
        self.boards.expand(player_id, direction)
    }

    /// Draws the next tiles straight into racks, `per_player` pairs of
    /// (player, count) served in order. Nothing changes if the bag runs short.
    pub fn deal(
        &mut self,
        per_player: &[(PlayerId, usize)],
        drawn_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<(PlayerId, Vec<TileSeq>)>, GameError> {
        let total: usize = per_player.iter().map(|(_, count)| count).sum();
        let tiles = self.bag.withdraw(total)?;
        let seqs: Vec<TileSeq> = tiles.iter().map(|t| t.seq).collect();
        self.bag.mark_drawn(&seqs, drawn_by, now)?;

        let mut dealt = Vec::with_capacity(per_player.len());
        let mut cursor = 0;
        for (player, count) in per_player {
            let share = seqs[cursor..cursor + count].to_vec();
            self.racks.draw(player, &share);
            dealt.push((player.clone(), share));
            cursor += count;
        }
        Ok(dealt)
    }

    pub fn rack(&self, player_id: &str) -> Vec<RackTile> {
        self.racks
            .snapshot(player_id)
            .into_iter()
            .filter_map(|entry| {
                let tile = self.bag.tile(entry.tile_seq)?;
                Some(RackTile {
                    idx: entry.idx,
                    seq: tile.seq,
                    letter: tile.letter,
                    is_joker: tile.is_joker(),
                })
            })
            .collect()
    }

    pub fn board(&self, player_id: &str) -> Vec<BoardTile> {
        self.boards
            .snapshot(player_id)
            .into_iter()
            .filter_map(|entry| {
                let tile = self.bag.tile(entry.tile_seq)?;
                Some(BoardTile {
                    seq: tile.seq,
                    letter: tile.letter,
                    is_joker: tile.is_joker(),
                    as_letter: entry.as_letter,
                    x: entry.x,
                    y: entry.y,
                    locked: entry.locked,
                })
            })
            .collect()
    }

    pub fn bounds(&self, player_id: &str) -> GridBounds {
        self.boards.bounds(player_id)
    }

    pub fn rack_count(&self, player_id: &str) -> usize {
        self.racks.count(player_id)
    }

    pub fn board_count(&self, player_id: &str) -> usize {
        self.boards.count(player_id)
    }

    pub fn words(&self, player_id: &str) -> Vec<Word> {
        extract(&self.boards.letters(player_id))
    }

    pub fn mixmo_enabled(&self, player_id: &str) -> bool {
        self.racks.is_empty_for(player_id) && self.bag_count() >= MIXMO_TILE_COUNT
    }

    /// True once the player has nothing left to play and the bag can no
    /// longer feed another mixmo.
    pub fn is_finished_by(&self, player_id: &str) -> bool {
        self.racks.is_empty_for(player_id) && self.bag_count() < MIXMO_TILE_COUNT
    }

    /// Checks that every drawn tile sits in exactly one rack or board of the
    /// player who holds it and that undrawn tiles are nowhere.
    pub fn check_tile_conservation(&self) -> Result<(), String> {
        let mut holders: BTreeMap<TileSeq, usize> = BTreeMap::new();
        for player in &self.players {
            for tile in self.racks.snapshot(player) {
                *holders.entry(tile.tile_seq).or_default() += 1;
            }
            for tile in self.boards.snapshot(player) {
                *holders.entry(tile.tile_seq).or_default() += 1;
            }
        }

        for entry in self.bag.entries() {
            let held = holders.get(&entry.tile.seq).copied().unwrap_or(0);
            match (entry.is_drawn(), held) {
                (true, 1) | (false, 0) => {}
                (drawn, held) => {
                    return Err(format!(
                        "tile {} drawn={} is held {} times",
                        entry.tile.seq, drawn, held
                    ))
                }
            }
        }
        Ok(())
    }

    fn tile(&self, seq: TileSeq) -> Result<Tile, GameError> {
        self.bag
            .tile(seq)
            .copied()
            .ok_or(GameError::TileNotFound { seq })
    }
}
