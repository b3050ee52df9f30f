use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::GameError;
use super::tiles::{PlayerId, Tile, TileSeq, LETTER_FREQUENCIES};

/// A tile together with its draw record. The tile is in the bag while `drawn_by` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagEntry {
    pub tile: Tile,
    pub drawn_by: Option<PlayerId>,
    pub drawn_at: Option<DateTime<Utc>>,
}

impl BagEntry {
    pub fn is_drawn(&self) -> bool {
        self.drawn_by.is_some()
    }
}

/// All tiles of a room in seq order. Entries are never removed or re-inserted,
/// drawing only flips them to drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    entries: Vec<BagEntry>,
}

impl Bag {
    /// Builds the shuffled bag for a room. The same room id always yields the same order.
    pub fn create(room_id: &str) -> Self {
        let mut letters: Vec<char> = LETTER_FREQUENCIES
            .iter()
            .flat_map(|(letter, count)| std::iter::repeat(*letter).take(*count))
            .collect();

        let mut rng = SineRng::new(seed_from_room_id(room_id));
        for i in (1..letters.len()).rev() {
            let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
            letters.swap(i, j);
        }

        Self::from_letters(&letters)
    }

    /// Builds a bag holding exactly these letters, seq 1 first
    pub fn from_letters(letters: &[char]) -> Self {
        let entries = letters
            .iter()
            .enumerate()
            .map(|(index, letter)| BagEntry {
                tile: Tile::new(index as TileSeq + 1, *letter),
                drawn_by: None,
                drawn_at: None,
            })
            .collect();

        Self { entries }
    }

    /// The `n` undrawn tiles with the lowest seqs, without marking them.
    pub fn withdraw(&self, n: usize) -> Result<Vec<Tile>, GameError> {
        let remaining = self.remaining_count();
        if remaining < n {
            return Err(GameError::InsufficientTiles {
                requested: n,
                remaining,
            });
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| !entry.is_drawn())
            .take(n)
            .map(|entry| entry.tile)
            .collect())
    }

    /// Marks tiles as drawn. Fails without marking anything if any tile is unknown,
    /// listed twice, or already drawn.
    pub fn mark_drawn(
        &mut self,
        seqs: &[TileSeq],
        by_player: &str,
        at: DateTime<Utc>,
    ) -> Result<(), GameError> {
        for (position, seq) in seqs.iter().enumerate() {
            let entry = self.entry(*seq).ok_or(GameError::TileNotFound { seq: *seq })?;
            if entry.is_drawn() || seqs[..position].contains(seq) {
                return Err(GameError::AlreadyDrawn { seq: *seq });
            }
        }

        for seq in seqs {
            if let Some(entry) = self.entry_mut(*seq) {
                entry.drawn_by = Some(by_player.to_string());
                entry.drawn_at = Some(at);
            }
        }

        Ok(())
    }

    /// Withdraws and marks `n` tiles in one step
    pub fn draw(
        &mut self,
        n: usize,
        by_player: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<Tile>, GameError> {
        let tiles = self.withdraw(n)?;
        let seqs: Vec<TileSeq> = tiles.iter().map(|tile| tile.seq).collect();
        self.mark_drawn(&seqs, by_player, at)?;
        Ok(tiles)
    }

    pub fn remaining_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_drawn()).count()
    }

    pub fn drawn_count(&self) -> usize {
        self.entries.len() - self.remaining_count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tile(&self, seq: TileSeq) -> Option<&Tile> {
        self.entry(seq).map(|entry| &entry.tile)
    }

    pub fn entry(&self, seq: TileSeq) -> Option<&BagEntry> {
        // seqs are dense from 1, so the entry sits at seq - 1
        let index = (seq as usize).checked_sub(1)?;
        self.entries.get(index).filter(|entry| entry.tile.seq == seq)
    }

    pub fn entries(&self) -> &[BagEntry] {
        &self.entries
    }

    fn entry_mut(&mut self, seq: TileSeq) -> Option<&mut BagEntry> {
        let index = (seq as usize).checked_sub(1)?;
        self.entries
            .get_mut(index)
            .filter(|entry| entry.tile.seq == seq)
    }
}

/// Seed of a room's shuffle: the sum of the UTF-16 code units of its id
pub fn seed_from_room_id(room_id: &str) -> u64 {
    room_id.encode_utf16().map(u64::from).sum()
}

/// Sine-based generator: each draw is the fractional part of `sin(seed) * 10000`,
/// then the seed advances by one.
///
/// Not random in any statistical sense; it only has to be reproducible so a
/// room's bag can be rebuilt identically.
struct SineRng {
    seed: f64,
}

impl SineRng {
    fn new(seed: u64) -> Self {
        Self { seed: seed as f64 }
    }

    fn next_f64(&mut self) -> f64 {
        let x = self.seed.sin() * 10000.0;
        self.seed += 1.0;
        x - x.floor()
    }
}
