use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

use super::errors::GameError;
use super::tiles::{PlayerId, TileSeq};
use super::words::PlacedLetter;

/// Side length of the default fixed grid
pub const DEFAULT_GRID_SIZE: u32 = 8;

/// Largest side a fixed grid may be created with
pub const MAX_GRID_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub player_id: PlayerId,
    pub tile_seq: TileSeq,
    pub x: i32,
    pub y: i32,
    pub as_letter: char,
    pub locked: bool,
}

/// Inclusive cell range a player may place tiles in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    /// `width` x `height` cells anchored at (0, 0). Sides past `i32::MAX` saturate.
    pub fn sized(width: u32, height: u32) -> Self {
        let last = |side: u32| i32::try_from(side).unwrap_or(i32::MAX).saturating_sub(1);
        Self {
            min_x: 0,
            max_x: last(width),
            min_y: 0,
            max_y: last(height),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Pushes one edge outward by a single cell
    pub fn expand(&mut self, direction: ExpandDirection) {
        match direction {
            ExpandDirection::Left => self.min_x = self.min_x.saturating_sub(1),
            ExpandDirection::Right => self.max_x = self.max_x.saturating_add(1),
            ExpandDirection::Up => self.min_y = self.min_y.saturating_sub(1),
            ExpandDirection::Down => self.max_y = self.max_y.saturating_add(1),
        }
    }

    pub fn width(&self) -> u32 {
        side(self.min_x, self.max_x)
    }

    pub fn height(&self) -> u32 {
        side(self.min_y, self.max_y)
    }
}

fn side(min: i32, max: i32) -> u32 {
    if max < min {
        0
    } else {
        max.abs_diff(min).saturating_add(1)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExpandDirection {
    Left,
    Right,
    Up,
    Down,
}

/// How a room's grid is sized, chosen once when the room is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Immutable `width` x `height` grid
    Fixed { width: u32, height: u32 },
    /// Starts at the default size, each edge can be pushed out on request
    Dynamic,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy::Fixed {
            width: DEFAULT_GRID_SIZE,
            height: DEFAULT_GRID_SIZE,
        }
    }
}

impl BoundsPolicy {
    pub fn initial_bounds(&self) -> GridBounds {
        match self {
            BoundsPolicy::Fixed { width, height } => GridBounds::sized(*width, *height),
            BoundsPolicy::Dynamic => GridBounds::sized(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, BoundsPolicy::Dynamic)
    }

    /// Rejects fixed grids with an empty side or a side above [`MAX_GRID_SIZE`]
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BoundsPolicy::Fixed { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err("grid dimensions must be positive".to_string());
                }
                if *width > MAX_GRID_SIZE || *height > MAX_GRID_SIZE {
                    return Err(format!(
                        "grid dimensions must be at most {}x{}",
                        MAX_GRID_SIZE, MAX_GRID_SIZE
                    ));
                }
                Ok(())
            }
            BoundsPolicy::Dynamic => Ok(()),
        }
    }
}

impl fmt::Display for BoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsPolicy::Fixed { width, height } => write!(f, "fixed:{}x{}", width, height),
            BoundsPolicy::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl FromStr for BoundsPolicy {
    type Err = String;

    /// Accepts `fixed`, `fixed:WxH` or `dynamic`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "dynamic" => Ok(BoundsPolicy::Dynamic),
            "fixed" => Ok(BoundsPolicy::default()),
            _ => {
                let size = s
                    .strip_prefix("fixed:")
                    .ok_or_else(|| format!("unknown bounds policy: {}", s))?;
                let (width, height) = size
                    .split_once('x')
                    .ok_or_else(|| format!("expected WxH, got: {}", size))?;
                let width: u32 = width.parse().map_err(|_| format!("bad width: {}", width))?;
                let height: u32 = height
                    .parse()
                    .map_err(|_| format!("bad height: {}", height))?;
                let policy = BoundsPolicy::Fixed { width, height };
                policy.validate()?;
                Ok(policy)
            }
        }
    }
}

/// Whether a placement changed the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed,
    Unchanged,
}

/// Placed tiles of every player in a room, plus each player's grid bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    policy: BoundsPolicy,
    entries: Vec<BoardEntry>,
    bounds: BTreeMap<PlayerId, GridBounds>,
}

impl BoardState {
    pub fn new(policy: BoundsPolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            bounds: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    pub fn bounds(&self, player_id: &str) -> GridBounds {
        self.bounds
            .get(player_id)
            .copied()
            .unwrap_or_else(|| self.policy.initial_bounds())
    }

    /// Puts a tile on the board.
    ///
    /// Placing a tile onto the cell it already occupies succeeds without change;
    /// a tile already on the board elsewhere must be moved instead.
    pub fn place(
        &mut self,
        player_id: &str,
        tile_seq: TileSeq,
        x: i32,
        y: i32,
        as_letter: char,
    ) -> Result<Placement, GameError> {
        if let Some(existing) = self.entry(player_id, tile_seq) {
            if existing.x == x && existing.y == y {
                return Ok(Placement::Unchanged);
            }
            return Err(GameError::NotInRack { seq: tile_seq });
        }

        self.check_target(player_id, tile_seq, x, y)?;

        self.entries.push(BoardEntry {
            player_id: player_id.to_string(),
            tile_seq,
            x,
            y,
            as_letter,
            locked: false,
        });
        Ok(Placement::Placed)
    }

    pub fn move_tile(
        &mut self,
        player_id: &str,
        tile_seq: TileSeq,
        x: i32,
        y: i32,
    ) -> Result<Placement, GameError> {
        let current = self
            .entry(player_id, tile_seq)
            .ok_or(GameError::NotOnBoard { seq: tile_seq })?;
        if current.x == x && current.y == y {
            return Ok(Placement::Unchanged);
        }
        if current.locked {
            return Err(GameError::TileLocked { seq: tile_seq });
        }

        self.check_target(player_id, tile_seq, x, y)?;

        if let Some(entry) = self.entry_mut(player_id, tile_seq) {
            entry.x = x;
            entry.y = y;
        }
        Ok(Placement::Placed)
    }

    /// Lifts one unlocked tile off the board
    pub fn take(&mut self, player_id: &str, tile_seq: TileSeq) -> Result<BoardEntry, GameError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.player_id == player_id && entry.tile_seq == tile_seq)
            .ok_or(GameError::NotOnBoard { seq: tile_seq })?;
        if self.entries[position].locked {
            return Err(GameError::TileLocked { seq: tile_seq });
        }
        Ok(self.entries.remove(position))
    }

    /// Lifts every unlocked tile of the player, in the order they were placed
    pub fn recall(&mut self, player_id: &str) -> Vec<TileSeq> {
        let mut recalled = Vec::new();
        self.entries.retain(|entry| {
            if entry.player_id == player_id && !entry.locked {
                recalled.push(entry.tile_seq);
                false
            } else {
                true
            }
        });
        recalled
    }

    pub fn lock(&mut self, player_id: &str, tile_seq: TileSeq) -> Result<(), GameError> {
        let entry = self
            .entry_mut(player_id, tile_seq)
            .ok_or(GameError::NotOnBoard { seq: tile_seq })?;
        entry.locked = true;
        Ok(())
    }

    pub fn expand(
        &mut self,
        player_id: &str,
        direction: ExpandDirection,
    ) -> Result<GridBounds, GameError> {
        if !self.policy.is_dynamic() {
            return Err(GameError::FixedBounds);
        }

        let mut bounds = self.bounds(player_id);
        bounds.expand(direction);
        self.bounds.insert(player_id.to_string(), bounds);
        Ok(bounds)
    }

    /// The player's tiles in reading order (row by row)
    pub fn snapshot(&self, player_id: &str) -> Vec<BoardEntry> {
        let mut entries: Vec<BoardEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.y, entry.x));
        entries
    }

    pub fn letters(&self, player_id: &str) -> Vec<PlacedLetter> {
        self.snapshot(player_id)
            .into_iter()
            .map(|entry| PlacedLetter::new(entry.x, entry.y, entry.as_letter))
            .collect()
    }

    pub fn contains(&self, player_id: &str, tile_seq: TileSeq) -> bool {
        self.entry(player_id, tile_seq).is_some()
    }

    pub fn count(&self, player_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .count()
    }

    pub fn entry(&self, player_id: &str, tile_seq: TileSeq) -> Option<&BoardEntry> {
        self.entries
            .iter()
            .find(|entry| entry.player_id == player_id && entry.tile_seq == tile_seq)
    }

    fn entry_mut(&mut self, player_id: &str, tile_seq: TileSeq) -> Option<&mut BoardEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.player_id == player_id && entry.tile_seq == tile_seq)
    }

    fn check_target(
        &self,
        player_id: &str,
        tile_seq: TileSeq,
        x: i32,
        y: i32,
    ) -> Result<(), GameError> {
        if !self.bounds(player_id).contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }

        let occupied = self.entries.iter().any(|entry| {
            entry.player_id == player_id
                && entry.x == x
                && entry.y == y
                && entry.tile_seq != tile_seq
        });
        if occupied {
            return Err(GameError::CellOccupied { x, y });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fixed_board() -> BoardState {
        BoardState::new(BoundsPolicy::default())
    }

    #[test]
    fn test_place_and_snapshot() {
        let mut board = fixed_board();
        assert_eq!(board.place("alice", 3, 1, 0, 'a'), Ok(Placement::Placed));
        assert_eq!(board.place("alice", 1, 0, 0, 'c'), Ok(Placement::Placed));

        let snapshot = board.snapshot("alice");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].tile_seq, 1);
        assert_eq!(snapshot[1].tile_seq, 3);
        assert!(!snapshot[0].locked);
        assert!(board.snapshot("bob").is_empty());
    }

    #[test]
    fn test_place_on_occupied_cell() {
        let mut board = fixed_board();
        board.place("alice", 1, 2, 2, 'a').unwrap();

        assert_eq!(
            board.place("alice", 2, 2, 2, 'b'),
            Err(GameError::CellOccupied { x: 2, y: 2 })
        );
        // boards are private: bob can use the same coordinates
        assert_eq!(board.place("bob", 2, 2, 2, 'b'), Ok(Placement::Placed));
    }

    #[test]
    fn test_place_same_tile_same_cell_is_noop() {
        let mut board = fixed_board();
        board.place("alice", 1, 4, 4, 'a').unwrap();
        assert_eq!(board.place("alice", 1, 4, 4, 'a'), Ok(Placement::Unchanged));
        assert_eq!(board.count("alice"), 1);
    }

    #[test]
    fn test_place_tile_already_elsewhere() {
        let mut board = fixed_board();
        board.place("alice", 1, 4, 4, 'a').unwrap();
        assert_eq!(
            board.place("alice", 1, 5, 4, 'a'),
            Err(GameError::NotInRack { seq: 1 })
        );
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(0, -1)]
    #[case(8, 0)]
    #[case(0, 8)]
    #[case(100, 100)]
    fn test_place_out_of_fixed_bounds(#[case] x: i32, #[case] y: i32) {
        let mut board = fixed_board();
        assert_eq!(
            board.place("alice", 1, x, y, 'a'),
            Err(GameError::OutOfBounds { x, y })
        );
        assert_eq!(board.count("alice"), 0);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(7, 7)]
    #[case(0, 7)]
    #[case(7, 0)]
    fn test_place_on_fixed_corners(#[case] x: i32, #[case] y: i32) {
        let mut board = fixed_board();
        assert_eq!(board.place("alice", 1, x, y, 'a'), Ok(Placement::Placed));
    }

    #[test]
    fn test_move_tile() {
        let mut board = fixed_board();
        board.place("alice", 1, 0, 0, 'a').unwrap();
        board.place("alice", 2, 1, 0, 'b').unwrap();

        assert_eq!(board.move_tile("alice", 1, 0, 1), Ok(Placement::Placed));
        let entry = board.entry("alice", 1).unwrap();
        assert_eq!((entry.x, entry.y), (0, 1));

        assert_eq!(board.move_tile("alice", 1, 0, 1), Ok(Placement::Unchanged));
        assert_eq!(
            board.move_tile("alice", 1, 1, 0),
            Err(GameError::CellOccupied { x: 1, y: 0 })
        );
        assert_eq!(
            board.move_tile("alice", 1, 9, 0),
            Err(GameError::OutOfBounds { x: 9, y: 0 })
        );
        assert_eq!(
            board.move_tile("alice", 5, 3, 3),
            Err(GameError::NotOnBoard { seq: 5 })
        );
    }

    #[test]
    fn test_locked_tiles_stay_put() {
        let mut board = fixed_board();
        board.place("alice", 1, 0, 0, 'a').unwrap();
        board.place("alice", 2, 1, 0, 'b').unwrap();
        board.lock("alice", 1).unwrap();

        assert_eq!(
            board.move_tile("alice", 1, 3, 3),
            Err(GameError::TileLocked { seq: 1 })
        );
        assert_eq!(board.take("alice", 1), Err(GameError::TileLocked { seq: 1 }));

        assert_eq!(board.recall("alice"), vec![2]);
        assert_eq!(board.count("alice"), 1);
        assert!(board.entry("alice", 1).unwrap().locked);
    }

    #[test]
    fn test_lock_missing_tile() {
        let mut board = fixed_board();
        assert_eq!(board.lock("alice", 4), Err(GameError::NotOnBoard { seq: 4 }));
    }

    #[test]
    fn test_recall_returns_placement_order() {
        let mut board = fixed_board();
        board.place("alice", 9, 5, 5, 'a').unwrap();
        board.place("alice", 2, 0, 0, 'b').unwrap();
        board.place("bob", 4, 1, 1, 'c').unwrap();
        board.place("alice", 6, 3, 1, 'd').unwrap();

        assert_eq!(board.recall("alice"), vec![9, 2, 6]);
        assert_eq!(board.count("alice"), 0);
        assert_eq!(board.count("bob"), 1);
        assert!(board.recall("alice").is_empty());
    }

    #[test]
    fn test_take_single_tile() {
        let mut board = fixed_board();
        board.place("alice", 1, 0, 0, 'a').unwrap();
        let entry = board.take("alice", 1).unwrap();
        assert_eq!(entry.tile_seq, 1);
        assert!(!board.contains("alice", 1));
        assert_eq!(board.take("alice", 1), Err(GameError::NotOnBoard { seq: 1 }));
    }

    #[test]
    fn test_expand_left_in_dynamic_mode() {
        let mut board = BoardState::new(BoundsPolicy::Dynamic);
        let before = board.bounds("alice");
        assert_eq!(
            board.place("alice", 1, before.min_x - 1, 0, 'a'),
            Err(GameError::OutOfBounds {
                x: before.min_x - 1,
                y: 0
            })
        );

        let after = board.expand("alice", ExpandDirection::Left).unwrap();
        assert_eq!(after.min_x, before.min_x - 1);
        assert_eq!(after.max_x, before.max_x);
        assert_eq!(after.min_y, before.min_y);
        assert_eq!(after.max_y, before.max_y);

        assert_eq!(
            board.place("alice", 1, before.min_x - 1, 0, 'a'),
            Ok(Placement::Placed)
        );
        // bob's bounds are untouched
        assert_eq!(board.bounds("bob"), before);
    }

    #[rstest]
    #[case(ExpandDirection::Left, GridBounds { min_x: -1, max_x: 7, min_y: 0, max_y: 7 })]
    #[case(ExpandDirection::Right, GridBounds { min_x: 0, max_x: 8, min_y: 0, max_y: 7 })]
    #[case(ExpandDirection::Up, GridBounds { min_x: 0, max_x: 7, min_y: -1, max_y: 7 })]
    #[case(ExpandDirection::Down, GridBounds { min_x: 0, max_x: 7, min_y: 0, max_y: 8 })]
    fn test_expand_moves_one_edge(#[case] direction: ExpandDirection, #[case] expected: GridBounds) {
        let mut board = BoardState::new(BoundsPolicy::Dynamic);
        assert_eq!(board.expand("alice", direction).unwrap(), expected);
    }

    #[test]
    fn test_expand_has_no_upper_limit() {
        let mut board = BoardState::new(BoundsPolicy::Dynamic);
        for _ in 0..50 {
            board.expand("alice", ExpandDirection::Right).unwrap();
        }
        assert_eq!(board.bounds("alice").width(), 58);
        assert_eq!(board.bounds("alice").height(), 8);
    }

    #[test]
    fn test_expand_rejected_in_fixed_mode() {
        let mut board = fixed_board();
        assert_eq!(
            board.expand("alice", ExpandDirection::Up),
            Err(GameError::FixedBounds)
        );
        assert_eq!(board.bounds("alice"), GridBounds::sized(8, 8));
    }

    #[rstest]
    #[case("fixed", BoundsPolicy::Fixed { width: 8, height: 8 })]
    #[case("FIXED:10x12", BoundsPolicy::Fixed { width: 10, height: 12 })]
    #[case("dynamic", BoundsPolicy::Dynamic)]
    fn test_parse_bounds_policy(#[case] input: &str, #[case] expected: BoundsPolicy) {
        assert_eq!(input.parse::<BoundsPolicy>().unwrap(), expected);
    }

    #[rstest]
    #[case("square")]
    #[case("fixed:8")]
    #[case("fixed:0x8")]
    #[case("fixed:ax8")]
    #[case("fixed:257x8")]
    #[case("fixed:8x2147483648")]
    #[case("fixed:4294967295x8")]
    fn test_parse_bounds_policy_errors(#[case] input: &str) {
        assert!(input.parse::<BoundsPolicy>().is_err());
    }

    #[rstest]
    #[case(0, 8)]
    #[case(257, 8)]
    #[case(8, 2_147_483_648)]
    #[case(4_294_967_295, 8)]
    fn test_validate_rejects_bad_fixed_sizes(#[case] width: u32, #[case] height: u32) {
        assert!(BoundsPolicy::Fixed { width, height }.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_limits() {
        let largest = BoundsPolicy::Fixed {
            width: MAX_GRID_SIZE,
            height: 1,
        };
        assert!(largest.validate().is_ok());
        assert!(BoundsPolicy::Dynamic.validate().is_ok());
    }

    #[rstest]
    #[case(2_147_483_648)]
    #[case(4_294_967_295)]
    fn test_oversized_bounds_saturate(#[case] width: u32) {
        let board = BoardState::new(BoundsPolicy::Fixed { width, height: 8 });
        let bounds = board.bounds("alice");
        assert_eq!(bounds.min_x, 0);
        assert_eq!(bounds.max_x, i32::MAX - 1);
        assert!(bounds.contains(0, 0));
        assert_eq!(bounds.width(), i32::MAX as u32);
        assert_eq!(bounds.height(), 8);
    }

    #[test]
    fn test_bounds_policy_display_round_trips() {
        let policy = BoundsPolicy::Fixed {
            width: 5,
            height: 6,
        };
        assert_eq!(policy.to_string(), "fixed:5x6");
        assert_eq!(policy.to_string().parse::<BoundsPolicy>().unwrap(), policy);
    }

    #[test]
    fn test_parse_expand_direction() {
        assert_eq!("left".parse::<ExpandDirection>().unwrap(), ExpandDirection::Left);
        assert_eq!("Down".parse::<ExpandDirection>().unwrap(), ExpandDirection::Down);
        assert!("sideways".parse::<ExpandDirection>().is_err());
        assert_eq!(ExpandDirection::Up.to_string(), "up");
    }
}
