use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::GameError;
use super::state::{GameSession, MIXMO_TILE_COUNT};
use super::tiles::{PlayerId, TileSeq};

/// Tiles moved by one successful mixmo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixmoOutcome {
    pub requester: PlayerId,
    pub other_player: PlayerId,
    /// All four tiles, lowest seq first
    pub drawn: Vec<TileSeq>,
    pub to_requester: Vec<TileSeq>,
    pub to_other: Vec<TileSeq>,
}

/// Runs the mixmo exchange on a session.
///
/// The room must already be known to be active. Checks run in a fixed order
/// (seats, membership, empty rack, bag size) and the first failure is
/// returned with the session untouched.
pub fn execute(
    session: &mut GameSession,
    requester: &str,
    now: DateTime<Utc>,
) -> Result<MixmoOutcome, GameError> {
    let count = session.players().len();
    if count != 2 {
        return Err(GameError::WrongPlayerCount { count });
    }
    let other_player = session.opponent_of(requester)?.clone();

    if session.rack_count(requester) > 0 {
        return Err(GameError::RackNotEmpty);
    }

    let remaining = session.bag_count();
    if remaining < MIXMO_TILE_COUNT {
        return Err(GameError::InsufficientTiles {
            requested: MIXMO_TILE_COUNT,
            remaining,
        });
    }

    let half = MIXMO_TILE_COUNT / 2;
    let dealt = session.deal(
        &[
            (requester.to_string(), half),
            (other_player.clone(), MIXMO_TILE_COUNT - half),
        ],
        requester,
        now,
    )?;

    let to_requester = dealt[0].1.clone();
    let to_other = dealt[1].1.clone();
    let drawn = to_requester.iter().chain(to_other.iter()).copied().collect();

    Ok(MixmoOutcome {
        requester: requester.to_string(),
        other_player,
        drawn,
        to_requester,
        to_other,
    })
}
