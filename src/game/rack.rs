use serde::{Deserialize, Serialize};

use super::errors::GameError;
use super::tiles::{PlayerId, TileSeq};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackEntry {
    pub player_id: PlayerId,
    pub tile_seq: TileSeq,
    /// Left-to-right position in the owner's rack
    pub idx: u32,
}

/// Racks of every player in a room.
///
/// Per player, `idx` is always `0..n-1`: draws append at `n`, removals shift
/// the following entries left so order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RackState {
    entries: Vec<RackEntry>,
}

impl RackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends tiles to the end of the player's rack, returning their new indices
    pub fn draw(&mut self, player_id: &str, tile_seqs: &[TileSeq]) -> Vec<u32> {
        let mut next_idx = self.count(player_id) as u32;
        let mut assigned = Vec::with_capacity(tile_seqs.len());

        for seq in tile_seqs {
            self.entries.push(RackEntry {
                player_id: player_id.to_string(),
                tile_seq: *seq,
                idx: next_idx,
            });
            assigned.push(next_idx);
            next_idx += 1;
        }

        assigned
    }

    pub fn remove(&mut self, player_id: &str, tile_seq: TileSeq) -> Result<RackEntry, GameError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.player_id == player_id && entry.tile_seq == tile_seq)
            .ok_or(GameError::NotInRack { seq: tile_seq })?;

        let removed = self.entries.remove(position);
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| entry.player_id == player_id && entry.idx > removed.idx)
        {
            entry.idx -= 1;
        }

        Ok(removed)
    }

    /// The player's rack ordered by idx
    pub fn snapshot(&self, player_id: &str) -> Vec<RackEntry> {
        let mut entries: Vec<RackEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.idx);
        entries
    }

    pub fn contains(&self, player_id: &str, tile_seq: TileSeq) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.player_id == player_id && entry.tile_seq == tile_seq)
    }

    pub fn count(&self, player_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .count()
    }

    pub fn is_empty_for(&self, player_id: &str) -> bool {
        self.count(player_id) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(entries: &[RackEntry]) -> Vec<TileSeq> {
        entries.iter().map(|entry| entry.tile_seq).collect()
    }

    fn indices(entries: &[RackEntry]) -> Vec<u32> {
        entries.iter().map(|entry| entry.idx).collect()
    }

    #[test]
    fn test_draw_appends_from_zero() {
        let mut racks = RackState::new();
        assert_eq!(racks.draw("alice", &[4, 9, 2]), vec![0, 1, 2]);
        assert_eq!(racks.draw("alice", &[7]), vec![3]);

        let rack = racks.snapshot("alice");
        assert_eq!(seqs(&rack), vec![4, 9, 2, 7]);
        assert_eq!(indices(&rack), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_players_have_independent_indices() {
        let mut racks = RackState::new();
        racks.draw("alice", &[1, 2]);
        racks.draw("bob", &[3]);

        assert_eq!(indices(&racks.snapshot("bob")), vec![0]);
        assert_eq!(racks.count("alice"), 2);
        assert_eq!(racks.count("bob"), 1);
        assert!(racks.is_empty_for("carol"));
    }

    #[test]
    fn test_remove_keeps_order_and_compacts() {
        let mut racks = RackState::new();
        racks.draw("alice", &[10, 11, 12, 13]);

        let removed = racks.remove("alice", 11).unwrap();
        assert_eq!(removed.idx, 1);

        let rack = racks.snapshot("alice");
        assert_eq!(seqs(&rack), vec![10, 12, 13]);
        assert_eq!(indices(&rack), vec![0, 1, 2]);

        racks.draw("alice", &[14]);
        assert_eq!(seqs(&racks.snapshot("alice")), vec![10, 12, 13, 14]);
        assert_eq!(indices(&racks.snapshot("alice")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_remove_missing_tile() {
        let mut racks = RackState::new();
        racks.draw("alice", &[1]);

        assert_eq!(racks.remove("alice", 2), Err(GameError::NotInRack { seq: 2 }));
        // another player's tile is not in alice's rack
        racks.draw("bob", &[3]);
        assert_eq!(racks.remove("alice", 3), Err(GameError::NotInRack { seq: 3 }));
        assert!(racks.contains("bob", 3));
    }
}
