use serde::{Deserialize, Serialize};

use crate::engine::status::{GameStatus, OutcomeTag, Winner};
use crate::engine::types::Color;

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMoveRequest {
    /// Position to move from; the standard start when absent.
    pub fen: Option<String>,
    pub notation: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub movetext: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResignRequest {
    pub resigning_player: Color,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub fen: String,
    pub san: String,
    pub uci: String,
    pub status: OutcomeTag,
    pub in_check: bool,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedMove {
    pub index: usize,
    pub notation: String,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub moves: Vec<ImportedMove>,
    pub status: OutcomeTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub index: usize,
    pub total: usize,
    pub fen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    pub label: String,
}

/// Final status a caller persists and broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Termination {
    pub status: OutcomeTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl From<GameStatus> for Termination {
    fn from(status: GameStatus) -> Self {
        Termination {
            status: status.tag(),
            winner: status.winner(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResignResponse {
    pub winner: Winner,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::status::DrawReason;

    #[test]
    fn move_response_uses_camel_case() {
        let response = MoveResponse {
            fen: "x".into(),
            san: "e4".into(),
            uci: "e2e4".into(),
            status: OutcomeTag::Ongoing,
            in_check: false,
            game_over: false,
            winner: None,
            message: "ok".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["inCheck"], false);
        assert_eq!(json["gameOver"], false);
        assert_eq!(json["status"], "ongoing");
        assert!(json.get("winner").is_none());
    }

    #[test]
    fn termination_from_status() {
        let t = Termination::from(GameStatus::Draw(DrawReason::ThreefoldRepetition));
        assert_eq!(t.status, OutcomeTag::Draw);
        assert_eq!(t.winner, Some(Winner::Draw));
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "draw", "winner": "draw" }));

        let t = Termination::from(GameStatus::Ongoing { in_check: true });
        assert_eq!(serde_json::to_value(t).unwrap(), serde_json::json!({ "status": "ongoing" }));
    }

    #[test]
    fn requests_deserialize() {
        let req: SubmitMoveRequest = serde_json::from_str(r#"{"notation":"e4"}"#).unwrap();
        assert_eq!(req.fen, None);
        let req: ResignRequest = serde_json::from_str(r#"{"resigningPlayer":"white"}"#).unwrap();
        assert_eq!(req.resigning_player, Color::White);
    }
}
