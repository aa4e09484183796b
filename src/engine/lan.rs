//! Long algebraic notation: `Ng1-f3`, `e4xd5`, `e7-e8=Q+`.
//!
//! The parser also accepts bare coordinate (UCI) moves such as `e2e4` and
//! `e7e8q`, which is what [`Move`]'s `Display` produces.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::san::PromotionPolicy;
use crate::engine::types::{ChessError, Move, PieceKind, Square};

/// Render a legal move in long algebraic notation, check suffix included.
pub fn to_lan(pos: &Position, mv: Move) -> String {
    let san = crate::engine::san::to_san(pos, mv);
    let suffix = san.trim_start_matches(|c: char| c != '+' && c != '#');

    if mv.flags.is_castling() {
        let base = if mv.flags.is_castle_kingside() {
            "O-O"
        } else {
            "O-O-O"
        };
        return format!("{base}{suffix}");
    }

    let mut lan = String::with_capacity(10);
    if let Some(piece) = pos.piece_at(mv.from)
        && piece.kind != PieceKind::Pawn
    {
        lan.push(piece.kind.letter());
    }
    lan.push_str(&mv.from.to_string());
    lan.push(if mv.flags.is_capture() { 'x' } else { '-' });
    lan.push_str(&mv.to.to_string());
    if let Some(promo) = mv.promotion {
        lan.push('=');
        lan.push(promo.letter());
    }
    lan.push_str(suffix);
    lan
}

/// Parse long algebraic or coordinate notation against the legal moves of `pos`.
pub fn parse_lan(pos: &Position, text: &str, policy: PromotionPolicy) -> Result<Move, ChessError> {
    let text = text.trim();
    let core = text.trim_end_matches(['+', '#', '!', '?']);
    if core.is_empty() {
        return Err(ChessError::malformed(text, "empty move"));
    }

    let legal = movegen::legal_moves(pos);

    if matches!(core, "O-O" | "0-0" | "O-O-O" | "0-0-0") {
        let kingside = core.len() == 3;
        return legal
            .iter()
            .find(|m| {
                if kingside {
                    m.flags.is_castle_kingside()
                } else {
                    m.flags.is_castle_queenside()
                }
            })
            .copied()
            .ok_or_else(|| ChessError::illegal(text, "castling is not available"));
    }

    let parts = split_lan(core).map_err(|reason| ChessError::malformed(text, reason))?;

    let Some(moving) = pos.piece_at(parts.from) else {
        return Err(ChessError::illegal(text, format!("no piece on {}", parts.from)));
    };
    if parts.piece.is_some_and(|k| k != moving.kind) {
        return Err(ChessError::illegal(
            text,
            format!("the piece on {} is a {}", parts.from, moving.kind),
        ));
    }

    let mut promotion = parts.promotion;
    let last_rank = (!pos.side_to_move()).back_rank();
    if moving.kind == PieceKind::Pawn && parts.to.rank() == last_rank && promotion.is_none() {
        match policy {
            PromotionPolicy::Explicit => {
                return Err(ChessError::malformed(text, "promotion piece required"));
            }
            PromotionPolicy::DefaultQueen => promotion = Some(PieceKind::Queen),
        }
    }

    let mv = legal
        .into_iter()
        .find(|m| m.from == parts.from && m.to == parts.to && m.promotion == promotion)
        .ok_or_else(|| ChessError::illegal(text, "no legal move matches"))?;

    if parts.capture && !mv.flags.is_capture() {
        return Err(ChessError::illegal(text, "nothing to capture"));
    }
    Ok(mv)
}

struct LanParts {
    piece: Option<PieceKind>,
    from: Square,
    capture: bool,
    to: Square,
    promotion: Option<PieceKind>,
}

fn split_lan(core: &str) -> Result<LanParts, String> {
    if !core.is_ascii() {
        return Err("non-ASCII characters".into());
    }
    let mut rest = core;

    let mut piece = None;
    if let Some(c) = rest.chars().next()
        && matches!(c, 'N' | 'B' | 'R' | 'Q' | 'K')
    {
        piece = PieceKind::from_letter(c);
        rest = &rest[1..];
    }

    let from = rest
        .get(..2)
        .and_then(Square::from_algebraic)
        .ok_or("missing origin square")?;
    rest = &rest[2..];

    let mut capture = false;
    if let Some(tail) = rest.strip_prefix('x') {
        capture = true;
        rest = tail;
    } else if let Some(tail) = rest.strip_prefix('-') {
        rest = tail;
    }

    let to = rest
        .get(..2)
        .and_then(Square::from_algebraic)
        .ok_or("missing destination square")?;
    rest = &rest[2..];

    let rest = rest.strip_prefix('=').unwrap_or(rest);
    let promotion = match rest {
        "" => None,
        letter if letter.len() == 1 => {
            let kind = letter
                .chars()
                .next()
                .and_then(PieceKind::from_letter)
                .filter(|k| PieceKind::PROMOTIONS.contains(k))
                .ok_or_else(|| format!("cannot promote to '{letter}'"))?;
            Some(kind)
        }
        other => return Err(format!("unexpected trailing text '{other}'")),
    };

    Ok(LanParts {
        piece,
        from,
        capture,
        to,
        promotion,
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ErrorKind;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn parse(p: &Position, text: &str) -> Result<Move, ChessError> {
        parse_lan(p, text, PromotionPolicy::Explicit)
    }

    #[test]
    fn renders_long_form() {
        let p = Position::starting();
        let nf3 = parse(&p, "g1f3").unwrap();
        assert_eq!(to_lan(&p, nf3), "Ng1-f3");

        let p = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let exd5 = parse(&p, "e4d5").unwrap();
        assert_eq!(to_lan(&p, exd5), "e4xd5");

        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let promo = parse(&p, "e7e8q").unwrap();
        assert_eq!(to_lan(&p, promo), "e7-e8=Q+");

        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let castle = parse(&p, "e1c1").unwrap();
        assert_eq!(to_lan(&p, castle), "O-O-O");
    }

    #[test]
    fn accepts_every_spelling() {
        let p = Position::starting();
        for text in ["e2e4", "e2-e4", "e2-e4!"] {
            let mv = parse(&p, text).unwrap();
            assert_eq!((mv.from, mv.to), (sq("e2"), sq("e4")));
            assert!(mv.flags.is_double_push());
        }
        for text in ["Ng1f3", "Ng1-f3", "g1f3"] {
            assert_eq!(parse(&p, text).unwrap().to, sq("f3"));
        }

        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        for text in ["e7e8n", "e7-e8=N", "e7e8N"] {
            assert_eq!(parse(&p, text).unwrap().promotion, Some(PieceKind::Knight));
        }
    }

    #[test]
    fn coordinate_display_round_trips() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        for mv in movegen::legal_moves(&p) {
            assert_eq!(parse(&p, &mv.to_string()).unwrap(), mv);
            assert_eq!(parse(&p, &to_lan(&p, mv)).unwrap(), mv);
        }
    }

    #[test]
    fn rejects_bad_input() {
        let p = Position::starting();
        assert_eq!(parse(&p, "e2").unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(parse(&p, "e2e9").unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(parse(&p, "e2e4zz").unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(parse(&p, "e2e5").unwrap_err().kind(), ErrorKind::Illegal);
        assert_eq!(parse(&p, "e4e5").unwrap_err().kind(), ErrorKind::Illegal);
        assert_eq!(parse(&p, "Bg1f3").unwrap_err().kind(), ErrorKind::Illegal);
        assert_eq!(parse(&p, "g1xf3").unwrap_err().kind(), ErrorKind::Illegal);
    }

    #[test]
    fn bare_promotion_follows_policy() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(parse(&p, "e7e8").unwrap_err().kind(), ErrorKind::Malformed);
        let mv = parse_lan(&p, "e7e8", PromotionPolicy::DefaultQueen).unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
    }
}
