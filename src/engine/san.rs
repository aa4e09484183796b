//! Standard Algebraic Notation (SAN) generation and parsing.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::apply;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Move, MoveFlags, PieceKind, Square};

// =========================================================================
// Promotion policy
// =========================================================================

/// What to do with a pawn move to the last rank that names no piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPolicy {
    /// The notation must name the piece (`e8=Q`); `e8` alone is malformed.
    #[default]
    Explicit,
    /// A bare `e8` promotes to a queen.
    DefaultQueen,
}

impl FromStr for PromotionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(PromotionPolicy::Explicit),
            "queen" | "default_queen" => Ok(PromotionPolicy::DefaultQueen),
            other => Err(format!("unknown promotion policy '{other}'")),
        }
    }
}

// =========================================================================
// SAN generation
// =========================================================================

/// Convert a legal move to SAN, including the `+` / `#` suffix.
pub fn to_san(pos: &Position, mv: Move) -> String {
    to_san_with(pos, mv, &movegen::legal_moves(pos))
}

/// Like [`to_san`], reusing an already generated legal move list.
pub fn to_san_with(pos: &Position, mv: Move, legal: &[Move]) -> String {
    let mut san = san_body(pos, mv, legal);
    san.push_str(check_suffix(pos, mv));
    san
}

/// SAN without the check suffix.
fn san_body(pos: &Position, mv: Move, legal: &[Move]) -> String {
    if mv.flags.is_castle_kingside() {
        return "O-O".into();
    }
    if mv.flags.is_castle_queenside() {
        return "O-O-O".into();
    }

    let Some(piece) = pos.piece_at(mv.from).map(|p| p.kind) else {
        return mv.to_string();
    };

    let mut san = String::with_capacity(8);

    if piece == PieceKind::Pawn {
        if mv.flags.is_capture() {
            // Prefix with departure file on captures: "exd5".
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter());
        }
    } else {
        san.push(piece.letter());
        san.push_str(&disambiguation(pos, mv, piece, legal));
        if mv.flags.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
    }

    san
}

/// Minimal origin hint: nothing, file, rank, or both.
fn disambiguation(pos: &Position, mv: Move, piece: PieceKind, legal: &[Move]) -> String {
    let rivals: Vec<Square> = legal
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && !m.flags.is_castling()
                && pos.piece_at(m.from).is_some_and(|p| p.kind == piece)
        })
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    match (same_file, same_rank) {
        (false, _) => mv.from.file_char().to_string(),
        (true, false) => mv.from.rank_char().to_string(),
        (true, true) => mv.from.to_string(),
    }
}

fn check_suffix(pos: &Position, mv: Move) -> &'static str {
    let next = apply::successor(pos, mv);
    if !next.is_in_check() {
        ""
    } else if movegen::legal_moves(&next).is_empty() {
        "#"
    } else {
        "+"
    }
}

// =========================================================================
// SAN parsing
// =========================================================================

/// The pieces of a SAN token once the syntax has been checked.
#[derive(Debug, PartialEq, Eq)]
struct SanParts {
    piece: PieceKind,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    capture: bool,
    to: Square,
    promotion: Option<PieceKind>,
}

/// Parse a SAN string with the default [`PromotionPolicy`].
pub fn parse_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    parse_san_with(pos, san, PromotionPolicy::default())
}

/// Parse a SAN string and return the matching legal move.
///
/// Trailing `+`, `#`, `!` and `?` are ignored, `0-0` is accepted for `O-O`,
/// and promotions may be written with or without `=`. Syntax errors are
/// [`ChessError::MalformedNotation`]; a well-formed token that matches no
/// legal move, or more than one, is [`ChessError::IllegalMove`].
pub fn parse_san_with(
    pos: &Position,
    san: &str,
    policy: PromotionPolicy,
) -> Result<Move, ChessError> {
    let text = san.trim();
    let core = text.trim_end_matches(['+', '#', '!', '?']);
    if core.is_empty() {
        return Err(ChessError::malformed(text, "empty move"));
    }

    let legal = movegen::legal_moves(pos);

    match core {
        "O-O" | "0-0" => return find_castling(&legal, text, MoveFlags::CASTLE_KINGSIDE),
        "O-O-O" | "0-0-0" => return find_castling(&legal, text, MoveFlags::CASTLE_QUEENSIDE),
        _ => {}
    }

    let mut parts = split_san(core).map_err(|reason| ChessError::malformed(text, reason))?;

    let last_rank = (!pos.side_to_move()).back_rank();
    if parts.piece == PieceKind::Pawn && parts.to.rank() == last_rank && parts.promotion.is_none()
    {
        match policy {
            PromotionPolicy::Explicit => {
                return Err(ChessError::malformed(text, "promotion piece required"));
            }
            PromotionPolicy::DefaultQueen => parts.promotion = Some(PieceKind::Queen),
        }
    }

    let candidates: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|m| matches_parts(pos, *m, &parts))
        .collect();

    match candidates.as_slice() {
        [] => Err(ChessError::illegal(text, "no legal move matches")),
        [mv] => Ok(*mv),
        many => Err(ChessError::illegal(
            text,
            format!("ambiguous: {} candidate moves", many.len()),
        )),
    }
}

fn matches_parts(pos: &Position, m: Move, parts: &SanParts) -> bool {
    if m.to != parts.to || m.flags.is_castling() || m.promotion != parts.promotion {
        return false;
    }
    if !pos.piece_at(m.from).is_some_and(|p| p.kind == parts.piece) {
        return false;
    }
    if parts.from_file.is_some_and(|f| m.from.file() != f)
        || parts.from_rank.is_some_and(|r| m.from.rank() != r)
    {
        return false;
    }
    if parts.capture && !m.flags.is_capture() {
        return false;
    }
    // Pawns capture only when written as a capture: "e5" is never "dxe5".
    if parts.piece == PieceKind::Pawn && !parts.capture && m.flags.is_capture() {
        return false;
    }
    true
}

/// Check the syntax of a non-castling SAN token (suffixes already removed).
fn split_san(core: &str) -> Result<SanParts, String> {
    if !core.is_ascii() {
        return Err("non-ASCII characters".into());
    }
    let mut bytes = core.as_bytes();

    // Leading piece letter (upper case only: "b4" is a pawn move).
    let piece = match bytes.first() {
        Some(&c) if matches!(c, b'N' | b'B' | b'R' | b'Q' | b'K') => {
            bytes = &bytes[1..];
            PieceKind::from_letter(c as char).ok_or("unknown piece letter")?
        }
        _ => PieceKind::Pawn,
    };

    // Trailing promotion: "=Q", "Q" or "q" after the destination rank.
    let mut promotion = None;
    if let Some((&last, rest)) = bytes.split_last()
        && last.is_ascii_alphabetic()
    {
        let kind = PieceKind::from_letter(last as char)
            .filter(|k| PieceKind::PROMOTIONS.contains(k))
            .ok_or_else(|| format!("cannot promote to '{}'", last as char))?;
        if piece != PieceKind::Pawn {
            return Err("only pawns promote".into());
        }
        promotion = Some(kind);
        bytes = rest.strip_suffix(b"=").unwrap_or(rest);
    }

    // Destination square: always the last two characters.
    if bytes.len() < 2 {
        return Err("missing destination square".into());
    }
    let (prefix, dest) = bytes.split_at(bytes.len() - 2);
    let dest = std::str::from_utf8(dest).unwrap_or_default();
    let to = Square::from_algebraic(dest)
        .ok_or_else(|| format!("invalid destination square '{dest}'"))?;

    // Optional capture marker, then optional origin file and rank.
    let (prefix, capture) = match prefix.strip_suffix(b"x") {
        Some(rest) => (rest, true),
        None => (prefix, false),
    };
    let mut from_file = None;
    let mut from_rank = None;
    let mut rest = prefix;
    if let Some((&c, tail)) = rest.split_first()
        && (b'a'..=b'h').contains(&c)
    {
        from_file = Some(c - b'a');
        rest = tail;
    }
    if let Some((&c, tail)) = rest.split_first()
        && (b'1'..=b'8').contains(&c)
    {
        from_rank = Some(c - b'1');
        rest = tail;
    }
    if !rest.is_empty() {
        return Err("unexpected characters before the destination".into());
    }

    Ok(SanParts {
        piece,
        from_file,
        from_rank,
        capture,
        to,
        promotion,
    })
}

fn find_castling(legal: &[Move], text: &str, side: MoveFlags) -> Result<Move, ChessError> {
    legal
        .iter()
        .find(|m| m.flags.contains(side))
        .copied()
        .ok_or_else(|| ChessError::illegal(text, "castling is not available"))
}

// =========================================================================
// Tests
// =========================================================================
