use serde::Serialize;

use crate::engine::ChessError;
use crate::live::LiveError;

/// Structured error handed back to the request layer; serializes to
/// `{"error": {"code", "message", "ply"?}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    /// 1-based move of a rejected transcript.
    pub ply: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ply: Option<usize>,
}

impl ApiError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            ply: None,
        }
    }

    /// HTTP status a request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self.code {
            "GAME_NOT_FOUND" | "INDEX_OUT_OF_RANGE" => 404,
            "TIMELINE_CONFLICT" => 409,
            "BACKLOG_FULL" => 429,
            "INVARIANT_VIOLATION" => 500,
            _ => 400,
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ErrorResponse {
            error: ErrorDetail {
                code: self.code,
                message: &self.message,
                ply: self.ply,
            },
        }
        .serialize(serializer)
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        let code = match &err {
            ChessError::MalformedFen(_) => "INVALID_FEN",
            ChessError::InvalidPosition(_) => "INVALID_POSITION",
            ChessError::MalformedNotation { .. } => "MALFORMED_NOTATION",
            ChessError::IllegalMove { .. } => "ILLEGAL_MOVE",
            ChessError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            ChessError::Transcript { .. } => "TRANSCRIPT_REJECTED",
            ChessError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            ChessError::TimelineConflict { .. } => "TIMELINE_CONFLICT",
            ChessError::BacklogFull { .. } => "BACKLOG_FULL",
        };
        let ply = match &err {
            ChessError::Transcript { ply, .. } => Some(*ply),
            _ => None,
        };
        ApiError {
            ply,
            ..ApiError::new(code, err.to_string())
        }
    }
}

impl From<LiveError> for ApiError {
    fn from(err: LiveError) -> Self {
        match err {
            LiveError::GameNotFound(id) => {
                ApiError::new("GAME_NOT_FOUND", format!("Game not found: {id}"))
            }
            LiveError::Chess(err) => err.into(),
        }
    }
}
