//! Move application: one position in, its successor out.

use tracing::error;

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{CastlingRights, ChessError, Color, Move, Piece, PieceKind, Square};

/// Apply a legal move and return the successor position.
///
/// `mv` must be one of the moves [`movegen::legal_moves`] produced for `pos`.
/// Anything else means the caller bypassed the engine and is reported as
/// [`ChessError::InvariantViolation`]; no position is produced.
pub fn apply_move(pos: &Position, mv: Move) -> Result<Position, ChessError> {
    if !movegen::is_legal(pos, mv) {
        let fen = pos.to_fen();
        error!(%mv, %fen, "refusing to apply a move that was not generated for this position");
        return Err(ChessError::InvariantViolation(format!(
            "move {mv} is not legal in {fen}"
        )));
    }
    Ok(successor(pos, mv))
}

/// Build the successor of a pseudo-legal move without checking it.
///
/// Used by the legality filter to try candidates on a copy.
pub(crate) fn successor(pos: &Position, mv: Move) -> Position {
    let us = pos.side_to_move;
    let mut next = pos.clone();

    let Some(moving) = pos.piece_at(mv.from) else {
        debug_assert!(false, "no piece on {} for move {mv}", mv.from);
        return next;
    };

    // ---- Captures ----
    let mut captured = pos.piece_at(mv.to).is_some();
    if mv.flags.is_en_passant() {
        // The captured pawn sits beside the mover, not on the target square.
        if let Some(victim) = Square::from_file_rank(mv.to.file(), mv.from.rank()) {
            next.board[victim.index()] = None;
            captured = true;
        }
    }

    // ---- Move (and possibly promote) the piece ----
    next.board[mv.from.index()] = None;
    let landing = mv.promotion.map_or(moving, |kind| Piece::new(kind, us));
    next.board[mv.to.index()] = Some(landing);
    if moving.kind == PieceKind::King {
        next.kings[us.index()] = mv.to;
    }

    // ---- Castling: move the rook ----
    if mv.flags.is_castling() {
        let rank = us.back_rank();
        let (rook_from, rook_to) = if mv.flags.is_castle_kingside() {
            (7, 5)
        } else {
            (0, 3)
        };
        if let (Some(from), Some(to)) = (
            Square::from_file_rank(rook_from, rank),
            Square::from_file_rank(rook_to, rank),
        ) {
            next.board[to.index()] = next.board[from.index()].take();
        }
    }

    // ---- Castling rights: anything leaving or landing on a home square ----
    next.castling_rights = pos
        .castling_rights
        .without(CastlingRights::revoked_by(mv.from))
        .without(CastlingRights::revoked_by(mv.to));

    // ---- En-passant target only right after a double push ----
    next.en_passant = if mv.flags.is_double_push() {
        mv.from.offset(0, us.forward())
    } else {
        None
    };

    // ---- Clocks ----
    next.halfmove_clock = if moving.kind == PieceKind::Pawn || captured {
        0
    } else {
        pos.halfmove_clock.saturating_add(1)
    };
    if us == Color::Black {
        next.fullmove_number = pos.fullmove_number.saturating_add(1);
    }

    next.side_to_move = !us;
    next
}

// =========================================================================
// Tests
// =========================================================================
