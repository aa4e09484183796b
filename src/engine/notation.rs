//! Single entry point for move text typed by a person or sent by a peer.

use crate::engine::board::Position;
use crate::engine::lan;
use crate::engine::san::{self, PromotionPolicy};
use crate::engine::types::{ChessError, ErrorKind, Move};

/// Resolve `text` to a legal move, trying SAN first and long/coordinate
/// notation second.
///
/// When neither form yields a move, an `IllegalMove` from whichever parser
/// understood the syntax wins over a `MalformedNotation`.
pub fn parse_move(pos: &Position, text: &str, policy: PromotionPolicy) -> Result<Move, ChessError> {
    let san_err = match san::parse_san_with(pos, text, policy) {
        Ok(mv) => return Ok(mv),
        Err(err) => err,
    };
    let lan_err = match lan::parse_lan(pos, text, policy) {
        Ok(mv) => return Ok(mv),
        Err(err) => err,
    };

    if san_err.kind() != ErrorKind::Illegal && lan_err.kind() == ErrorKind::Illegal {
        Err(lan_err)
    } else {
        Err(san_err)
    }
}
