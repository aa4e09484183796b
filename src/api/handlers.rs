//! The contract the engine offers a request-handling layer.
//!
//! Every handler is a plain function from a request model to a response
//! model. Authentication, persistence and fan-out stay with the caller.

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::apply::apply_move;
use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::notation::parse_move;
use crate::engine::san::to_san_with;
use crate::engine::status::{GameStatus, Winner, classify};
use crate::engine::timeline::Timeline;

use super::errors::ApiError;
use super::models::*;

// =========================================================================
// Submit Move
// =========================================================================

/// Validate one move against a position and describe the result.
///
/// Only the submitted position is known here, so repetition draws are left
/// to callers that keep a [`Timeline`].
pub fn submit_move(config: &EngineConfig, input: SubmitMoveRequest) -> Result<MoveResponse, ApiError> {
    let position = match input.fen.as_deref() {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::starting(),
    };

    let legal = legal_moves(&position);
    let mv = parse_move(&position, input.notation.trim(), config.promotion).map_err(|err| {
        debug!(notation = %input.notation, error = %err, "move refused");
        ApiError::from(err)
    })?;
    let san = to_san_with(&position, mv, &legal);
    let next = apply_move(&position, mv)?;
    let status = classify(&next, std::slice::from_ref(&position), &legal_moves(&next));

    let message = match status {
        GameStatus::Checkmate { winner } => format!("Checkmate! Winner: {winner}"),
        GameStatus::Stalemate => "Game drawn by stalemate.".to_string(),
        GameStatus::Draw(reason) => format!("Game drawn ({}).", reason.as_str().replace('_', " ")),
        GameStatus::Ongoing { in_check: true } => format!("Move {san} played. Check!"),
        GameStatus::Ongoing { in_check: false } => format!("Move {san} played."),
    };

    Ok(MoveResponse {
        fen: next.to_fen(),
        san,
        uci: mv.to_string(),
        status: status.tag(),
        in_check: status.is_check(),
        game_over: status.is_game_over(),
        winner: status.winner(),
        message,
    })
}

// =========================================================================
// Import
// =========================================================================

/// Replay a whole transcript; nothing is returned unless every move is valid.
pub fn import_game(config: &EngineConfig, input: ImportRequest) -> Result<ImportResponse, ApiError> {
    let mut timeline = Timeline::with_config(config.clone());
    timeline.import(&input.movetext).map_err(|err| {
        warn!(error = %err, "transcript rejected");
        ApiError::from(err)
    })?;

    let moves = timeline
        .entries()
        .iter()
        .map(|entry| ImportedMove {
            index: entry.index,
            notation: entry.notation.clone(),
            fen: entry.fen.clone(),
        })
        .collect();
    let status = timeline.status();

    Ok(ImportResponse {
        moves,
        status: status.tag(),
        winner: status.winner(),
    })
}

// =========================================================================
// Render
// =========================================================================

/// Board state at move `index` with the squares to highlight.
pub fn render(timeline: &Timeline, index: usize) -> Result<RenderResponse, ApiError> {
    let view = timeline.view(index)?;
    let label = view.label();
    Ok(RenderResponse {
        index: view.index,
        total: view.total,
        fen: view.fen,
        from: view.last_move.map(|(from, _)| from.to_string()),
        to: view.last_move.map(|(_, to)| to.to_string()),
        notation: view.notation,
        label,
    })
}

// =========================================================================
// Termination
// =========================================================================

pub fn termination(status: GameStatus) -> Termination {
    Termination::from(status)
}

/// The opponent of the resigning side wins.
pub fn resign(input: ResignRequest) -> ResignResponse {
    let winner = !input.resigning_player;
    ResignResponse {
        winner: Winner::side(winner),
        message: format!("{} resigned. Winner: {winner}", input.resigning_player),
    }
}

// =========================================================================
// Tests
// =========================================================================
