//! FEN (Forsyth–Edwards Notation) encoding and decoding.
//!
//! Decoding is strict: anything that would not re-encode to the same six
//! fields, or that describes an impossible position, is rejected.

use std::fmt;
use std::str::FromStr;

use crate::engine::board::Position;
use crate::engine::types::{CastlingRights, ChessError, Color, Piece, PieceKind, Square};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parse a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::MalformedFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        // ----- Field 1: Piece placement -----
        let board = parse_placement(fields[0])?;

        // ----- Field 2: Side to move -----
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::MalformedFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        let castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::MalformedFen(format!("invalid castling field: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        let en_passant = match fields[3] {
            "-" => None,
            text => {
                let sq = Square::from_algebraic(text).ok_or_else(|| {
                    ChessError::MalformedFen(format!("invalid en passant square: '{text}'"))
                })?;
                // The target sits behind a pawn the opponent just pushed.
                let expected_rank = match side_to_move {
                    Color::White => 5,
                    Color::Black => 2,
                };
                if sq.rank() != expected_rank {
                    return Err(ChessError::MalformedFen(format!(
                        "en passant square {sq} is impossible with {side_to_move} to move"
                    )));
                }
                check_double_push(&board, sq, !side_to_move)?;
                Some(sq)
            }
        };

        // ----- Fields 5 and 6: Clocks -----
        let halfmove_clock: u16 = fields[4].parse().map_err(|_| {
            ChessError::MalformedFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;
        let fullmove_number: u16 = fields[5].parse().map_err(|_| {
            ChessError::MalformedFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if fullmove_number == 0 {
            return Err(ChessError::MalformedFen(
                "fullmove number must be at least 1".into(),
            ));
        }

        Position::from_parts(
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        )
    }

    /// Encode as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty = 0u8;
            for file in 0..8u8 {
                match Square::from_file_rank(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move.to_fen_char());
        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(
            " {} {}",
            self.halfmove_clock, self.fullmove_number
        ));
        fen
    }
}

/// An en passant target needs the `pusher`'s pawn just beyond it and empty
/// squares on the target and the pawn's origin.
fn check_double_push(
    board: &[Option<Piece>; 64],
    target: Square,
    pusher: Color,
) -> Result<(), ChessError> {
    let dr = pusher.forward();
    let landed = target.offset(0, dr);
    let origin = target.offset(0, -dr);
    let pawn_landed = landed
        .and_then(|sq| board[sq.index()])
        .is_some_and(|p| p == Piece::new(PieceKind::Pawn, pusher));
    let path_clear = board[target.index()].is_none()
        && origin.is_some_and(|sq| board[sq.index()].is_none());
    if pawn_landed && path_clear {
        Ok(())
    } else {
        Err(ChessError::InvalidPosition(format!(
            "en passant square {target} does not follow a {pusher} double push"
        )))
    }
}

fn parse_placement(field: &str) -> Result<[Option<Piece>; 64], ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::MalformedFen(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = [None; 64];
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8; // FEN starts from rank 8
        let mut file: u8 = 0;
        for ch in rank_str.chars() {
            if file > 7 {
                return Err(ChessError::MalformedFen(format!(
                    "too many squares in rank {}",
                    rank + 1
                )));
            }
            if let Some(digit) = ch.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(ChessError::MalformedFen(format!(
                        "invalid empty count '{ch}' in rank {}",
                        rank + 1
                    )));
                }
                file += digit as u8;
            } else if let Some(piece) = Piece::from_fen_char(ch) {
                if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                    return Err(ChessError::InvalidPosition(format!(
                        "pawn on back rank {}",
                        rank + 1
                    )));
                }
                if let Some(sq) = Square::from_file_rank(file, rank) {
                    board[sq.index()] = Some(piece);
                }
                file += 1;
            } else {
                return Err(ChessError::MalformedFen(format!(
                    "invalid character '{ch}' in piece placement"
                )));
            }
        }
        if file != 8 {
            return Err(ChessError::MalformedFen(format!(
                "rank {} has {} squares instead of 8",
                rank + 1,
                file
            )));
        }
    }
    Ok(board)
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ErrorKind;

    #[test]
    fn starting_position_encodes_to_start_fen() {
        assert_eq!(Position::starting().to_fen(), START_FEN);
        assert_eq!(Position::from_fen(START_FEN).unwrap(), Position::starting());
    }

    #[test]
    fn round_trip_known_positions() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "4k3/8/8/8/8/8/8/4K3 b - - 65535 999",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn from_str_and_display() {
        let pos: Position = START_FEN.parse().unwrap();
        assert_eq!(pos.to_string(), START_FEN);
    }

    #[test]
    fn rejects_malformed_structure() {
        for fen in [
            "",
            "8/8/8/8/8/8/8/8 w - - 0",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w QKkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 70000 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1",
        ] {
            let err = Position::from_fen(fen).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed, "{fen}: {err}");
        }
    }

    #[test]
    fn rejects_en_passant_on_wrong_rank() {
        // White to move: the target must be on rank 6.
        assert!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1")
                .is_err()
        );
    }

    #[test]
    fn rejects_impossible_positions() {
        for fen in [
            // No black king.
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            // Two white kings.
            "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
            // Black in check with White to move.
            "4k3/8/8/8/8/8/4R3/4K3 w - - 0 1",
            // Pawn on the first rank.
            "4k3/8/8/8/8/8/8/P3K3 w - - 0 1",
            // En passant target behind a knight.
            "4k3/8/8/8/3pN3/8/8/4K3 b - e3 0 1",
            // En passant target with no pawn in front of it.
            "4k3/8/8/8/8/8/8/4K3 w - d6 0 1",
            // En passant target occupied.
            "4k3/8/8/8/3pP3/4N3/8/4K3 b - e3 0 1",
            // Origin of the double push occupied.
            "4k3/8/8/8/3pP3/8/4N3/4K3 b - e3 0 1",
        ] {
            let err = Position::from_fen(fen).unwrap_err();
            assert!(
                matches!(err, ChessError::InvalidPosition(_)),
                "{fen}: {err}"
            );
        }
        // Not a problem when it is Black's turn.
        assert!(Position::from_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1").is_ok());
        // A genuine double push.
        assert!(Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1").is_ok());
    }
}
