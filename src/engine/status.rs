//! Terminal-state detection: checkmate, stalemate and the automatic draws.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::board::Position;
use crate::engine::types::{Color, Move, PieceKind};

/// Reason for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    FiftyMoveRule,
    InsufficientMaterial,
    ThreefoldRepetition,
}

impl DrawReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::InsufficientMaterial => "insufficient_material",
            DrawReason::ThreefoldRepetition => "threefold_repetition",
        }
    }
}

/// Coarse outcome tag persisted and broadcast by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeTag {
    Ongoing,
    Checkmate,
    Stalemate,
    Draw,
}

impl OutcomeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeTag::Ongoing => "ongoing",
            OutcomeTag::Checkmate => "checkmate",
            OutcomeTag::Stalemate => "stalemate",
            OutcomeTag::Draw => "draw",
        }
    }
}

/// Result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn side(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }

    /// PGN result token.
    pub fn result_token(&self) -> &'static str {
        match self {
            Winner::White => "1-0",
            Winner::Black => "0-1",
            Winner::Draw => "1/2-1/2",
        }
    }
}

/// Classification of a position within its game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing { in_check: bool },
    /// `winner` is the side that delivered mate.
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            GameStatus::Ongoing { .. } => OutcomeTag::Ongoing,
            GameStatus::Checkmate { .. } => OutcomeTag::Checkmate,
            GameStatus::Stalemate => OutcomeTag::Stalemate,
            GameStatus::Draw(_) => OutcomeTag::Draw,
        }
    }

    /// `None` while the game is still running.
    pub fn winner(&self) -> Option<Winner> {
        match self {
            GameStatus::Ongoing { .. } => None,
            GameStatus::Checkmate { winner } => Some(Winner::side(*winner)),
            GameStatus::Stalemate | GameStatus::Draw(_) => Some(Winner::Draw),
        }
    }

    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameStatus::Ongoing { .. })
    }

    pub fn is_check(&self) -> bool {
        matches!(
            self,
            GameStatus::Ongoing { in_check: true } | GameStatus::Checkmate { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Ongoing { in_check: true } => "check",
            GameStatus::Draw(reason) => reason.as_str(),
            other => other.tag().as_str(),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `pos`.
///
/// `history` holds the positions that came before `pos` in the game, oldest
/// first, without `pos` itself. `legal` is the legal move list of `pos`.
pub fn classify(pos: &Position, history: &[Position], legal: &[Move]) -> GameStatus {
    let in_check = pos.is_in_check();

    if legal.is_empty() {
        return if in_check {
            GameStatus::Checkmate {
                winner: !pos.side_to_move(),
            }
        } else {
            GameStatus::Stalemate
        };
    }

    if pos.halfmove_clock() >= 100 {
        return GameStatus::Draw(DrawReason::FiftyMoveRule);
    }

    if is_insufficient_material(pos) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }

    if is_threefold_repetition(pos, history) {
        return GameStatus::Draw(DrawReason::ThreefoldRepetition);
    }

    GameStatus::Ongoing { in_check }
}

/// The same repetition key three times, counting `pos`.
///
/// Only the last `halfmove_clock` positions can match: a pawn move or a
/// capture in between changes the placement for good.
fn is_threefold_repetition(pos: &Position, history: &[Position]) -> bool {
    let key = pos.repetition_key();
    let earlier = history
        .iter()
        .rev()
        .take(pos.halfmove_clock() as usize)
        .filter(|p| p.repetition_key() == key)
        .count();
    earlier + 1 >= 3
}

/// No side can possibly mate: bare kings, a single minor piece, or only
/// bishops that all stand on squares of one colour.
pub fn is_insufficient_material(pos: &Position) -> bool {
    let mut knights = 0;
    let mut minors = 0;
    let mut bishop_shades = [false; 2];

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces(color) {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::Knight => {
                    knights += 1;
                    minors += 1;
                }
                PieceKind::Bishop => {
                    bishop_shades[usize::from(sq.is_dark())] = true;
                    minors += 1;
                }
            }
        }
    }

    minors <= 1 || (knights == 0 && !(bishop_shades[0] && bishop_shades[1]))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::movegen;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn status(fen: &str) -> GameStatus {
        let p = pos(fen);
        classify(&p, &[], &movegen::legal_moves(&p))
    }

    #[test]
    fn start_is_ongoing() {
        let s = status(crate::engine::fen::START_FEN);
        assert_eq!(s, GameStatus::Ongoing { in_check: false });
        assert_eq!(s.tag(), OutcomeTag::Ongoing);
        assert_eq!(s.winner(), None);
        assert!(!s.is_game_over());
    }

    #[test]
    fn checkmate_names_the_winner() {
        // Fool's mate.
        let s = status("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(
            s,
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(s.winner(), Some(Winner::Black));
        assert_eq!(s.tag().as_str(), "checkmate");
    }

    #[test]
    fn stalemate() {
        let s = status("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
        assert_eq!(s, GameStatus::Stalemate);
        assert_eq!(s.winner(), Some(Winner::Draw));
    }

    #[test]
    fn check_is_still_ongoing() {
        let s = status("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert_eq!(s, GameStatus::Ongoing { in_check: false });
        let s = status("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1");
        assert_eq!(s, GameStatus::Ongoing { in_check: true });
        assert_eq!(s.as_str(), "check");
    }

    #[test]
    fn fifty_move_rule() {
        assert_eq!(
            status("4k3/8/8/8/8/8/8/R3K3 w - - 100 80"),
            GameStatus::Draw(DrawReason::FiftyMoveRule)
        );
        assert_eq!(
            status("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").tag(),
            OutcomeTag::Ongoing
        );
    }

    #[test]
    fn mate_beats_fifty_move_rule() {
        let s = status("R5k1/5ppp/8/8/8/8/8/4K3 b - - 120 90");
        assert_eq!(s.tag(), OutcomeTag::Checkmate);
    }

    #[test]
    fn insufficient_material_table() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KB2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KN2 w - - 0 1",
            // Bishops on c1 and f4 are both dark.
            "4k3/8/8/8/5b2/8/8/2B1K3 w - - 0 1",
        ] {
            assert!(is_insufficient_material(&pos(fen)), "{fen}");
            assert_eq!(status(fen), GameStatus::Draw(DrawReason::InsufficientMaterial));
        }
        for fen in [
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/3NKN2 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1",
            "4k3/8/8/8/8/8/8/2N1KB2 w - - 0 1",
            "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
        ] {
            assert!(!is_insufficient_material(&pos(fen)), "{fen}");
        }
    }

    #[test]
    fn threefold_repetition_counts_current_position() {
        use crate::engine::apply::apply_move;
        use crate::engine::san::parse_san;

        let mut history = Vec::new();
        let mut current = Position::starting();
        for text in ["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"] {
            let mv = parse_san(&current, text).unwrap();
            let next = apply_move(&current, mv).unwrap();
            history.push(std::mem::replace(&mut current, next));
        }
        let legal = movegen::legal_moves(&current);
        assert_eq!(
            classify(&current, &history, &legal),
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        );
        // Two occurrences are not enough.
        let legal = movegen::legal_moves(&history[4]);
        assert_eq!(
            classify(&history[4], &history[..4], &legal).tag(),
            OutcomeTag::Ongoing
        );
    }
}
