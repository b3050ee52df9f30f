use serde::{Deserialize, Serialize};

/// JWT claims identifying a player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerClaims {
    pub player_id: String,
    pub display_name: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Response structure for session creation endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub token: String, // The JWT
    pub player_id: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_claims_serialization() {
        let claims = PlayerClaims {
            player_id: "3f2b".to_string(),
            display_name: "brave-otter".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("brave-otter"));

        let deserialized: PlayerClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
