//! Legal move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves (ignoring pins / check evasion).
//!   2. Filter: build the successor, verify the mover's king is not attacked
//!      in it, discard the successor.
//!
//! The input position is never touched; every candidate is tried on a copy.

use crate::engine::apply;
use crate::engine::attacks::{self, DIAGONAL, ORTHOGONAL};
use crate::engine::board::Position;
use crate::engine::types::{CastlingRights, Color, Move, MoveFlags, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move();
    pseudo_legal_moves(pos)
        .into_iter()
        .filter(|&mv| {
            let next = apply::successor(pos, mv);
            !attacks::is_square_attacked(&next, next.king_square(us), !us)
        })
        .collect()
}

/// Generate all legal moves originating from a specific square.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|m| m.from == from)
        .collect()
}

/// Is `mv` exactly one of the moves [`legal_moves`] produces for `pos`?
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    legal_moves_from(pos, mv.from).contains(&mv)
}

// =========================================================================
// Pseudo-legal generation
// =========================================================================

pub(crate) fn pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in pos.pieces(pos.side_to_move()) {
        piece_moves(pos, from, piece, &mut moves);
    }
    moves
}

/// Every movement rule of the game, one arm per piece kind.
fn piece_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let t = attacks::tables();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(pos, from, piece.color, moves),
        PieceKind::Knight => step_moves(pos, from, t.knight_targets(from), moves),
        PieceKind::Bishop => slide_moves(pos, from, DIAGONAL, moves),
        PieceKind::Rook => slide_moves(pos, from, ORTHOGONAL, moves),
        PieceKind::Queen => {
            slide_moves(pos, from, ORTHOGONAL, moves);
            slide_moves(pos, from, DIAGONAL, moves);
        }
        PieceKind::King => {
            step_moves(pos, from, t.king_targets(from), moves);
            castling_moves(pos, from, piece.color, moves);
        }
    }
}

/// Flags for landing on `to`: capture if an enemy stands there, `None` if a
/// friendly piece blocks it.
fn landing(pos: &Position, to: Square) -> Option<MoveFlags> {
    match pos.piece_at(to) {
        None => Some(MoveFlags::NONE),
        Some(p) if p.color != pos.side_to_move() => Some(MoveFlags::CAPTURE),
        Some(_) => None,
    }
}

fn step_moves(pos: &Position, from: Square, targets: &[Square], moves: &mut Vec<Move>) {
    for &to in targets {
        if let Some(flags) = landing(pos, to) {
            moves.push(Move::new(from, to, flags));
        }
    }
}

fn slide_moves(
    pos: &Position,
    from: Square,
    directions: std::ops::Range<usize>,
    moves: &mut Vec<Move>,
) {
    let t = attacks::tables();
    for direction in directions {
        for &to in t.ray(from, direction) {
            match landing(pos, to) {
                Some(MoveFlags::NONE) => moves.push(Move::new(from, to, MoveFlags::NONE)),
                Some(flags) => {
                    moves.push(Move::new(from, to, flags));
                    break;
                }
                None => break,
            }
        }
    }
}

// =========================================================================
// Pawn moves
// =========================================================================

fn pawn_moves(pos: &Position, from: Square, us: Color, moves: &mut Vec<Move>) {
    let forward = us.forward();
    let start_rank = if us == Color::White { 1 } else { 6 };

    // --- Pushes ---
    if let Some(one) = from.offset(0, forward)
        && pos.piece_at(one).is_none()
    {
        push_pawn_move(from, one, MoveFlags::NONE, moves);

        if from.rank() == start_rank
            && let Some(two) = one.offset(0, forward)
            && pos.piece_at(two).is_none()
        {
            moves.push(Move::new(from, two, MoveFlags::DOUBLE_PUSH));
        }
    }

    // --- Captures, including en passant ---
    for df in [-1, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(p) if p.color != us => push_pawn_move(from, to, MoveFlags::CAPTURE, moves),
            None if pos.en_passant() == Some(to) => moves.push(Move::new(
                from,
                to,
                MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
            )),
            _ => {}
        }
    }
}

/// Push a pawn move, expanding it into the four promotions on the last rank.
fn push_pawn_move(from: Square, to: Square, flags: MoveFlags, moves: &mut Vec<Move>) {
    if to.rank() == 0 || to.rank() == 7 {
        for promo in PieceKind::PROMOTIONS {
            moves.push(Move::promoting(from, to, promo, flags));
        }
    } else {
        moves.push(Move::new(from, to, flags));
    }
}

// =========================================================================
// Castling
// =========================================================================

fn castling_moves(pos: &Position, king_from: Square, us: Color, moves: &mut Vec<Move>) {
    let them = !us;
    let rank = us.back_rank();
    let home = |file: u8| Square::from_file_rank(file, rank);
    let own_rook = Some(Piece::new(PieceKind::Rook, us));

    if Some(king_from) != home(4) {
        return;
    }

    // (right, rook file, squares that must be empty, squares the king occupies
    // or crosses, king destination file, flag)
    let sides = [
        (
            CastlingRights::kingside(us),
            7u8,
            &[5u8, 6][..],
            [4u8, 5, 6],
            6u8,
            MoveFlags::CASTLE_KINGSIDE,
        ),
        (
            CastlingRights::queenside(us),
            0,
            &[1, 2, 3][..],
            [4, 3, 2],
            2,
            MoveFlags::CASTLE_QUEENSIDE,
        ),
    ];

    for (right, rook_file, empty, king_path, to_file, flag) in sides {
        if !pos.castling_rights().has(right) {
            continue;
        }
        if home(rook_file).and_then(|sq| pos.piece_at(sq)) != own_rook {
            continue;
        }
        let clear = empty
            .iter()
            .filter_map(|&f| home(f))
            .all(|sq| pos.piece_at(sq).is_none());
        if !clear {
            continue;
        }
        // Origin, transit and landing squares are each tested on their own.
        let safe = king_path
            .iter()
            .filter_map(|&f| home(f))
            .all(|sq| !attacks::is_square_attacked(pos, sq, them));
        if !safe {
            continue;
        }
        if let Some(to) = home(to_file) {
            moves.push(Move::new(king_from, to, flag));
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
