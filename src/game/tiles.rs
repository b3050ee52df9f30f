use serde::{Deserialize, Serialize};

use super::errors::GameError;

/// Identity of a tile within a room, assigned at bag creation starting at 1
pub type TileSeq = u32;

/// Opaque authenticated player identifier
pub type PlayerId = String;

/// Wildcard marker, a joker can stand for any letter on the board
pub const JOKER: char = '*';

/// Letter distribution of a fresh bag.
///
/// The order matters: the bag is laid out letter by letter in this order
/// before being shuffled, so changing it changes every room's bag.
pub const LETTER_FREQUENCIES: [(char, usize); 27] = [
    ('a', 9),
    ('b', 2),
    ('c', 2),
    ('d', 3),
    ('e', 15),
    ('f', 2),
    ('g', 2),
    ('h', 2),
    ('i', 8),
    ('j', 1),
    ('k', 1),
    ('l', 5),
    ('m', 3),
    ('n', 6),
    ('o', 6),
    ('p', 2),
    ('q', 1),
    ('r', 6),
    ('s', 6),
    ('t', 6),
    ('u', 6),
    ('v', 2),
    ('w', 1),
    ('x', 1),
    ('y', 1),
    ('z', 1),
    (JOKER, 2),
];

/// Total number of tiles in a fresh bag
pub fn bag_size() -> usize {
    LETTER_FREQUENCIES.iter().map(|(_, count)| count).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub seq: TileSeq,
    pub letter: char,
}

impl Tile {
    pub fn new(seq: TileSeq, letter: char) -> Self {
        Self {
            seq,
            letter: letter.to_ascii_lowercase(),
        }
    }

    pub fn is_joker(&self) -> bool {
        self.letter == JOKER
    }
}

/// Folds a player-supplied letter to its canonical form: lowercase, accents stripped.
///
/// Returns `None` unless the input is exactly one letter once folded.
pub fn fold(input: &str) -> Option<char> {
    let mut chars = input.trim().chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    let lower = first.to_lowercase().next()?;
    let base = strip_accent(lower);
    base.is_ascii_lowercase().then_some(base)
}

/// Resolves the letter a tile shows on the board.
///
/// Regular tiles always show their own letter. A joker shows the folded letter
/// its owner picked, or the wildcard marker while no letter is chosen.
pub fn resolve_face(tile: &Tile, requested: Option<&str>) -> Result<char, GameError> {
    if !tile.is_joker() {
        return Ok(tile.letter);
    }

    match requested {
        None => Ok(JOKER),
        Some(raw) if raw.trim() == JOKER.to_string() => Ok(JOKER),
        Some(raw) => fold(raw).ok_or_else(|| GameError::InvalidLetter(raw.to_string())),
    }
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
