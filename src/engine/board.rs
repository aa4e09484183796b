//! Mailbox position representation.
//!
//! `Position` stores piece placement as 64 optional pieces in LERF order
//! (a1 = 0 … h8 = 63) together with side to move, castling rights, the
//! en-passant target and both move counters. Positions are values: there is no
//! public way to change one, every transition builds a new `Position`.

use crate::engine::attacks;
use crate::engine::types::{CastlingRights, ChessError, Color, Piece, PieceKind, Square};

/// The four fields that identify a position for repetition purposes.
/// Move counters are deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    board: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) board: [Option<Piece>; 64],
    /// King squares indexed by colour, kept in sync with `board`.
    pub(crate) kings: [Square; 2],
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Position {
    /// Standard starting position.
    pub fn starting() -> Self {
        let mut board = [None; 64];
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            board[file] = Some(Piece::new(kind, Color::White));
            board[8 + file] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board[48 + file] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board[56 + file] = Some(Piece::new(kind, Color::Black));
        }
        Position {
            board,
            kings: [Square::E1, Square::E8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Assemble a position from decoded parts, enforcing the structural
    /// invariants: one king per colour and the side not to move not in check.
    pub(crate) fn from_parts(
        board: [Option<Piece>; 64],
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) -> Result<Self, ChessError> {
        let mut kings = [None, None];
        for sq in Square::all() {
            if let Some(Piece {
                kind: PieceKind::King,
                color,
            }) = board[sq.index()]
            {
                if kings[color.index()].replace(sq).is_some() {
                    return Err(ChessError::InvalidPosition(format!(
                        "{color} has more than one king"
                    )));
                }
            }
        }
        let [Some(white_king), Some(black_king)] = kings else {
            let missing = if kings[0].is_none() {
                Color::White
            } else {
                Color::Black
            };
            return Err(ChessError::InvalidPosition(format!("{missing} has no king")));
        };

        let pos = Position {
            board,
            kings: [white_king, black_king],
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        };

        let idle = !side_to_move;
        if attacks::is_square_attacked(&pos, pos.king_square(idle), side_to_move) {
            return Err(ChessError::InvalidPosition(format!(
                "{idle} is in check but it is {side_to_move} to move"
            )));
        }
        Ok(pos)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Occupied squares of one colour, in index order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.board[sq.index()] {
            Some(piece) if piece.color == color => Some((sq, piece)),
            _ => None,
        })
    }

    /// Is the side-to-move's king currently attacked?
    pub fn is_in_check(&self) -> bool {
        let us = self.side_to_move;
        attacks::is_square_attacked(self, self.king_square(us), !us)
    }

    pub fn repetition_key(&self) -> RepetitionKey {
        RepetitionKey {
            board: self.board,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
        }
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8u8).rev() {
            s.push((b'1' + rank) as char);
            for file in 0..8u8 {
                s.push(' ');
                let ch = Square::from_file_rank(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or('.', Piece::to_fen_char);
                s.push(ch);
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
