use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::exchange::MixmoOutcome;
use super::tiles::TileSeq;

/// What a logged game event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameEventKind {
    Start,
    Place,
    Move,
    Return,
    Recall,
    Lock,
    Expand,
    Mixmo,
    Finish,
}

/// Append-only audit entry for a committed game mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEventRecord {
    pub id: String,
    pub room_id: String,
    pub player_id: String,
    pub kind: GameEventKind,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl GameEventRecord {
    pub fn new(
        room_id: &str,
        player_id: &str,
        kind: GameEventKind,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            kind,
            payload,
            created_at,
        }
    }

    pub fn start(room_id: &str, owner_id: &str, players: &[String], at: DateTime<Utc>) -> Self {
        Self::new(
            room_id,
            owner_id,
            GameEventKind::Start,
            json!({ "players": players }),
            at,
        )
    }

    pub fn mixmo(room_id: &str, outcome: &MixmoOutcome, at: DateTime<Utc>) -> Self {
        Self::new(
            room_id,
            &outcome.requester,
            GameEventKind::Mixmo,
            json!({
                "distributed": outcome.drawn,
                "caller": { "player_id": outcome.requester, "tiles": outcome.to_requester },
                "other": { "player_id": outcome.other_player, "tiles": outcome.to_other },
            }),
            at,
        )
    }

    pub fn tiles(
        room_id: &str,
        player_id: &str,
        kind: GameEventKind,
        tiles: &[TileSeq],
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(room_id, player_id, kind, json!({ "tiles": tiles }), at)
    }

    pub fn finish(room_id: &str, player_id: &str, bag_remaining: usize, at: DateTime<Utc>) -> Self {
        Self::new(
            room_id,
            player_id,
            GameEventKind::Finish,
            json!({ "finished_by": player_id, "bag_remaining": bag_remaining }),
            at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_names() {
        assert_eq!(GameEventKind::Mixmo.to_string(), "mixmo");
        assert_eq!(GameEventKind::from_str("recall").unwrap(), GameEventKind::Recall);
        assert_eq!(
            serde_json::to_string(&GameEventKind::Return).unwrap(),
            r#""return""#
        );
    }

    #[test]
    fn test_mixmo_payload_groups() {
        let outcome = MixmoOutcome {
            requester: "alice".to_string(),
            other_player: "bob".to_string(),
            drawn: vec![13, 14, 15, 16],
            to_requester: vec![13, 14],
            to_other: vec![15, 16],
        };

        let record = GameEventRecord::mixmo("room-1", &outcome, Utc::now());
        assert_eq!(record.kind, GameEventKind::Mixmo);
        assert_eq!(record.player_id, "alice");
        assert_eq!(record.payload["distributed"], json!([13, 14, 15, 16]));
        assert_eq!(record.payload["caller"]["tiles"], json!([13, 14]));
        assert_eq!(record.payload["other"]["player_id"], json!("bob"));
    }

    #[test]
    fn test_records_get_unique_ids() {
        let now = Utc::now();
        let first = GameEventRecord::tiles("r", "p", GameEventKind::Lock, &[1], now);
        let second = GameEventRecord::tiles("r", "p", GameEventKind::Lock, &[1], now);
        assert_ne!(first.id, second.id);
    }
}
