use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank (0-based) the pieces of this colour start on.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank direction a pawn of this colour advances in.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// FEN side-to-move letter.
    pub fn to_fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceKind / Piece
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may promote to, in generation order.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Upper-case SAN letter (`P` for pawns, which SAN itself omits).
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// Inverse of [`PieceKind::letter`], case-insensitive.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

/// A coloured piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// FEN character: upper case for White, lower case for Black.
    pub fn to_fen_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// Parse a FEN piece character; case selects the colour.
    pub fn from_fen_char(c: char) -> Option<Self> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        PieceKind::from_letter(c).map(|kind| Piece { kind, color })
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the board (LERF: a1=0, h1=7, a8=56, h8=63).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const COUNT: usize = 64;

    pub const A1: Square = Square(0);
    pub const E1: Square = Square(4);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const E8: Square = Square(60);
    pub const H8: Square = Square(63);

    /// Build from a raw index; `None` when the index is off the board.
    #[inline]
    pub fn new(index: u8) -> Option<Self> {
        (index < 64).then_some(Square(index))
    }

    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Square(rank * 8 + file))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Step by a (file, rank) delta, staying on the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    /// `true` for dark squares (a1 is dark).
    #[inline]
    pub const fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }

    /// All 64 squares in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_file_rank(file, rank)
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank()) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

// ---------------------------------------------------------------------------
// MoveFlags
// ---------------------------------------------------------------------------

/// Flags for special move types packed in a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const NONE: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(2);
    pub const CASTLE_KINGSIDE: MoveFlags = MoveFlags(4);
    pub const CASTLE_QUEENSIDE: MoveFlags = MoveFlags(8);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(16);

    #[inline]
    pub fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_capture(self) -> bool {
        self.contains(Self::CAPTURE)
    }

    #[inline]
    pub fn is_en_passant(self) -> bool {
        self.contains(Self::EN_PASSANT)
    }

    #[inline]
    pub fn is_castle_kingside(self) -> bool {
        self.contains(Self::CASTLE_KINGSIDE)
    }

    #[inline]
    pub fn is_castle_queenside(self) -> bool {
        self.contains(Self::CASTLE_QUEENSIDE)
    }

    #[inline]
    pub fn is_castling(self) -> bool {
        self.is_castle_kingside() || self.is_castle_queenside()
    }

    #[inline]
    pub fn is_double_push(self) -> bool {
        self.contains(Self::DOUBLE_PUSH)
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        MoveFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move as generated for one specific position.
///
/// Two moves compare equal only if every field matches, flags included, so a
/// hand-built `Move` with wrong flags is not "the same move" as the generated one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl Move {
    pub fn new(from: Square, to: Square, flags: MoveFlags) -> Self {
        Move {
            from,
            to,
            promotion: None,
            flags,
        }
    }

    pub fn promoting(from: Square, to: Square, promotion: PieceKind, flags: MoveFlags) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
            flags,
        }
    }
}

/// Coordinate (UCI) form: `e2e4`, `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Castling availability bitfield: bits 0-3 = K, Q, k, q.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: CastlingRights = CastlingRights(1);
    pub const WHITE_QUEENSIDE: CastlingRights = CastlingRights(2);
    pub const BLACK_KINGSIDE: CastlingRights = CastlingRights(4);
    pub const BLACK_QUEENSIDE: CastlingRights = CastlingRights(8);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    const FEN_ORDER: [(CastlingRights, char); 4] = [
        (Self::WHITE_KINGSIDE, 'K'),
        (Self::WHITE_QUEENSIDE, 'Q'),
        (Self::BLACK_KINGSIDE, 'k'),
        (Self::BLACK_QUEENSIDE, 'q'),
    ];

    #[inline]
    pub fn has(self, right: CastlingRights) -> bool {
        self.0 & right.0 != 0
    }

    /// Copy with `right` removed.
    #[inline]
    pub fn without(self, right: CastlingRights) -> Self {
        CastlingRights(self.0 & !right.0)
    }

    #[inline]
    pub fn kingside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline]
    pub fn queenside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Rights lost once anything moves from or to `sq` (king and rook homes).
    pub fn revoked_by(sq: Square) -> Self {
        match sq.index() {
            0 => Self::WHITE_QUEENSIDE,
            4 => CastlingRights(Self::WHITE_KINGSIDE.0 | Self::WHITE_QUEENSIDE.0),
            7 => Self::WHITE_KINGSIDE,
            56 => Self::BLACK_QUEENSIDE,
            60 => CastlingRights(Self::BLACK_KINGSIDE.0 | Self::BLACK_QUEENSIDE.0),
            63 => Self::BLACK_KINGSIDE,
            _ => Self::NONE,
        }
    }

    /// Parse a FEN castling field. Only the canonical `KQkq` ordering (or `-`)
    /// is accepted so that encoding a parsed value reproduces the input.
    pub fn from_fen(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(Self::NONE);
        }
        if s.is_empty() {
            return None;
        }
        let mut rights = Self::NONE;
        let mut next = 0;
        for c in s.chars() {
            let pos = Self::FEN_ORDER[next..].iter().position(|&(_, ch)| ch == c)?;
            rights.0 |= Self::FEN_ORDER[next + pos].0.0;
            next += pos + 1;
        }
        Some(rights)
    }

    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        Self::FEN_ORDER
            .iter()
            .filter(|(right, _)| self.has(*right))
            .map(|&(_, c)| c)
            .collect()
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Coarse classification of a [`ChessError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input could not be parsed at all.
    Malformed,
    /// Well-formed move that is not legal here.
    Illegal,
    /// The caller bypassed the engine contract.
    Invariant,
    /// A bulk transcript was rejected.
    Transcript,
    /// Timeline index or chain problem.
    Timeline,
}

/// Domain errors for the chess engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("malformed FEN: {0}")]
    MalformedFen(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("malformed notation '{notation}': {reason}")]
    MalformedNotation { notation: String, reason: String },

    #[error("illegal move '{notation}': {reason}")]
    IllegalMove { notation: String, reason: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("transcript rejected at move {ply} ('{token}'): {source}")]
    Transcript {
        ply: usize,
        token: String,
        source: Box<ChessError>,
    },

    #[error("index {index} is out of range for a timeline of {len} moves")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("timeline entry {index} does not fit the committed chain: {reason}")]
    TimelineConflict { index: usize, reason: String },

    #[error("out-of-order backlog is full ({limit} pending moves)")]
    BacklogFull { limit: usize },
}

impl ChessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChessError::MalformedFen(_) | ChessError::MalformedNotation { .. } => {
                ErrorKind::Malformed
            }
            ChessError::IllegalMove { .. } => ErrorKind::Illegal,
            ChessError::InvalidPosition(_) | ChessError::InvariantViolation(_) => {
                ErrorKind::Invariant
            }
            ChessError::Transcript { .. } => ErrorKind::Transcript,
            ChessError::IndexOutOfRange { .. }
            | ChessError::TimelineConflict { .. }
            | ChessError::BacklogFull { .. } => ErrorKind::Timeline,
        }
    }

    pub(crate) fn malformed(notation: &str, reason: impl Into<String>) -> Self {
        ChessError::MalformedNotation {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn illegal(notation: &str, reason: impl Into<String>) -> Self {
        ChessError::IllegalMove {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn color_toggle_and_display() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
        assert_eq!(Color::Black.to_string(), "black");
        assert_eq!(Color::White.to_fen_char(), 'w');
    }

    #[test]
    fn piece_fen_char_round_trip() {
        for c in "PNBRQKpnbrqk".chars() {
            let piece = Piece::from_fen_char(c).unwrap();
            assert_eq!(piece.to_fen_char(), c);
        }
        assert_eq!(Piece::from_fen_char('x'), None);
        assert_eq!(Piece::from_fen_char('1'), None);
    }

    #[test]
    fn square_coordinates() {
        assert_eq!(sq("a1").index(), 0);
        assert_eq!(sq("h8").index(), 63);
        let e4 = sq("e4");
        assert_eq!((e4.file(), e4.rank()), (4, 3));
        assert_eq!(e4.to_string(), "e4");
        assert!(sq("a1").is_dark());
        assert!(!sq("h1").is_dark());
    }

    #[test]
    fn square_parsing_rejects_garbage() {
        for bad in ["", "a", "a9", "i1", "e44", "E4"] {
            assert_eq!(Square::from_algebraic(bad), None, "{bad}");
        }
        assert_eq!(Square::new(64), None);
    }

    #[test]
    fn square_offset_stays_on_board() {
        assert_eq!(sq("a1").offset(-1, 0), None);
        assert_eq!(sq("h8").offset(0, 1), None);
        assert_eq!(sq("e4").offset(1, 2), Some(sq("f6")));
    }

    #[test]
    fn move_flags_combine() {
        let flags = MoveFlags::CAPTURE | MoveFlags::EN_PASSANT;
        assert!(flags.is_capture());
        assert!(flags.is_en_passant());
        assert!(!flags.is_castling());
        assert!(MoveFlags::CASTLE_QUEENSIDE.is_castling());
    }

    #[test]
    fn move_displays_as_coordinates() {
        let m = Move::new(sq("e2"), sq("e4"), MoveFlags::DOUBLE_PUSH);
        assert_eq!(m.to_string(), "e2e4");
        let promo = Move::promoting(sq("e7"), sq("e8"), PieceKind::Knight, MoveFlags::NONE);
        assert_eq!(promo.to_string(), "e7e8n");
    }

    #[test]
    fn castling_rights_fen_round_trip() {
        for s in ["-", "K", "Kq", "KQkq", "kq", "Q", "Qk"] {
            let cr = CastlingRights::from_fen(s).unwrap();
            assert_eq!(cr.to_fen(), s);
        }
    }

    #[test]
    fn castling_rights_reject_non_canonical() {
        for s in ["", "X", "KZ", "qk", "KK", "-K", "kQ"] {
            assert_eq!(CastlingRights::from_fen(s), None, "{s}");
        }
    }

    #[test]
    fn castling_rights_revocation() {
        let cr = CastlingRights::ALL.without(CastlingRights::revoked_by(sq("e1")));
        assert_eq!(cr.to_fen(), "kq");
        let cr = cr.without(CastlingRights::revoked_by(sq("h8")));
        assert_eq!(cr.to_fen(), "q");
        assert_eq!(CastlingRights::revoked_by(sq("d4")), CastlingRights::NONE);
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            ChessError::MalformedFen("x".into()).kind(),
            ErrorKind::Malformed
        );
        assert_eq!(ChessError::illegal("Qh5", "nope").kind(), ErrorKind::Illegal);
        assert_eq!(
            ChessError::InvariantViolation("x".into()).kind(),
            ErrorKind::Invariant
        );
        let nested = ChessError::Transcript {
            ply: 3,
            token: "Nf9".into(),
            source: Box::new(ChessError::malformed("Nf9", "bad square")),
        };
        assert_eq!(nested.kind(), ErrorKind::Transcript);
        assert!(nested.to_string().contains("move 3"));
    }
}
