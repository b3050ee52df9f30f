use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

impl Direction {
    fn step(&self) -> (i32, i32) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A letter sitting on a board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedLetter {
    pub x: i32,
    pub y: i32,
    pub letter: char,
}

impl PlacedLetter {
    pub fn new(x: i32, y: i32, letter: char) -> Self {
        Self { x, y, letter }
    }
}

/// A maximal run of two or more adjacent letters in one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub direction: Direction,
    pub start: Position,
    pub text: String,
}

/// Finds every horizontal then every vertical word formed by the given letters.
///
/// Words come out in the order their first tile appears in the input. When two
/// entries share a cell the later one wins.
pub fn extract(tiles: &[PlacedLetter]) -> Vec<Word> {
    let grid: HashMap<(i32, i32), char> = tiles
        .iter()
        .map(|tile| ((tile.x, tile.y), tile.letter))
        .collect();

    let mut words = Vec::new();
    for direction in [Direction::Horizontal, Direction::Vertical] {
        collect_runs(tiles, &grid, direction, &mut words);
    }
    words
}

fn collect_runs(
    tiles: &[PlacedLetter],
    grid: &HashMap<(i32, i32), char>,
    direction: Direction,
    words: &mut Vec<Word>,
) {
    let (dx, dy) = direction.step();
    let mut visited: HashSet<(i32, i32)> = HashSet::new();

    for tile in tiles {
        if visited.contains(&(tile.x, tile.y)) {
            continue;
        }

        let (mut x, mut y) = (tile.x, tile.y);
        while grid.contains_key(&(x - dx, y - dy)) {
            x -= dx;
            y -= dy;
        }
        let start = Position { x, y };

        let mut text = String::new();
        while let Some(letter) = grid.get(&(x, y)) {
            text.push(*letter);
            visited.insert((x, y));
            x += dx;
            y += dy;
        }

        if text.chars().count() > 1 {
            words.push(Word {
                direction,
                start,
                text,
            });
        }
    }
}
