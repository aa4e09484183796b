//! PGN (Portable Game Notation) move-text import and export.
//!
//! Import replays a move-text block from the starting position and stops at
//! the first token that is not a legal move. Export produces the Seven Tag
//! Roster followed by numbered move text wrapped at 80 columns.

use chrono::NaiveDate;

use crate::engine::apply;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::notation;
use crate::engine::san::{self, PromotionPolicy};
use crate::engine::timeline::Timeline;
use crate::engine::types::{ChessError, Move};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
const LINE_WIDTH: usize = 80;

// =========================================================================
// Import
// =========================================================================

/// One move of an imported transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedMove {
    /// 1-based half-move number.
    pub ply: usize,
    pub mv: Move,
    /// Canonical SAN, whatever spelling the transcript used.
    pub notation: String,
    /// Position after the move.
    pub position: Position,
}

/// Replay `text` from the starting position.
///
/// Tag pairs, comments, NAGs, variations, move numbers and the result token
/// are skipped. The first move that fails to parse or is illegal aborts the
/// whole import with [`ChessError::Transcript`] naming its 1-based ply.
pub fn parse_movetext(text: &str, policy: PromotionPolicy) -> Result<Vec<ParsedMove>, ChessError> {
    let mut position = Position::starting();
    let mut moves = Vec::new();

    for token in move_tokens(text) {
        let ply = moves.len() + 1;
        let transcript_err = |source: ChessError| ChessError::Transcript {
            ply,
            token: token.to_string(),
            source: Box::new(source),
        };

        let mv = notation::parse_move(&position, token, policy).map_err(transcript_err)?;
        let legal = movegen::legal_moves(&position);
        let notation = san::to_san_with(&position, mv, &legal);
        position = apply::apply_move(&position, mv).map_err(transcript_err)?;

        moves.push(ParsedMove {
            ply,
            mv,
            notation,
            position: position.clone(),
        });
    }

    Ok(moves)
}

/// Split move text into move tokens, dropping everything that is not a move.
fn move_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'[' => i = skip_tag_pair(bytes, i),
            b'{' => i = skip_past(bytes, i, b'}'),
            b';' => i = skip_past(bytes, i, b'\n'),
            b'(' => i = skip_variation(bytes, i),
            b'$' => {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            _ => {
                let start = i;
                while i < bytes.len() && !is_delimiter(bytes[i]) {
                    i += 1;
                }
                if start == i {
                    // A lone delimiter such as ')' that opens nothing: keep it
                    // so the move parser reports it.
                    i += 1;
                }
                let word = &text[start..i];
                if RESULT_TOKENS.contains(&word) {
                    break;
                }
                let word = strip_move_number(word);
                if !word.is_empty() && !is_annotation(word) {
                    tokens.push(word);
                }
            }
        }
    }

    tokens
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'[' | b'{' | b';' | b'(' | b')' | b'$')
}

/// Index just past the next `end` at or after `from` (or the end of input).
fn skip_past(bytes: &[u8], from: usize, end: u8) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == end)
        .map_or(bytes.len(), |offset| from + offset + 1)
}

/// Skip `[Name "value"]`, honouring `\"` inside the value.
fn skip_tag_pair(bytes: &[u8], from: usize) -> usize {
    let mut i = from + 1;
    let mut quoted = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quoted => i += 1,
            b'"' => quoted = !quoted,
            b']' if !quoted => return i + 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Skip a recursive annotation variation, including nested ones and any
/// comments inside it.
fn skip_variation(bytes: &[u8], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'{' => {
                i = skip_past(bytes, i, b'}');
                continue;
            }
            b';' => {
                i = skip_past(bytes, i, b'\n');
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// `12.`, `12...` and `12.Nf3` → ``, ``, `Nf3`. Words without a numbered
/// prefix are returned unchanged.
fn strip_move_number(word: &str) -> &str {
    let digits = word.bytes().take_while(u8::is_ascii_digit).count();
    let rest = &word[digits..];
    let dots = rest.bytes().take_while(|&b| b == b'.').count();
    if dots == 0 {
        // "O-O" style tokens written with zeros start with a digit.
        return word;
    }
    &rest[dots..]
}

/// Stand-alone move assessment such as `!?` or `??`.
fn is_annotation(word: &str) -> bool {
    word.bytes().all(|b| matches!(b, b'!' | b'?'))
}

// =========================================================================
// Export
// =========================================================================

/// Header values for an exported game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PgnTags {
    pub event: String,
    pub site: String,
    pub date: NaiveDate,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl PgnTags {
    /// Casual-game tags dated today (UTC).
    pub fn today() -> Self {
        PgnTags {
            date: chrono::Utc::now().date_naive(),
            ..Self::undated()
        }
    }

    fn undated() -> Self {
        PgnTags {
            event: "Casual Game".into(),
            site: "?".into(),
            date: NaiveDate::MIN,
            round: "-".into(),
            white: "White".into(),
            black: "Black".into(),
        }
    }
}

impl Default for PgnTags {
    fn default() -> Self {
        Self::today()
    }
}

/// Export a timeline as a PGN string.
pub fn to_pgn(timeline: &Timeline, tags: &PgnTags) -> String {
    let mut pgn = String::with_capacity(512);
    let date = tags.date.format("%Y.%m.%d").to_string();

    for (name, value) in [
        ("Event", tags.event.as_str()),
        ("Site", tags.site.as_str()),
        ("Date", date.as_str()),
        ("Round", tags.round.as_str()),
        ("White", tags.white.as_str()),
        ("Black", tags.black.as_str()),
        ("Result", result_token(timeline)),
    ] {
        pgn.push_str(&format!("[{name} \"{}\"]\n", escape_tag_value(value)));
    }

    pgn.push('\n');
    pgn.push_str(&movetext(timeline));
    pgn.push('\n');
    pgn
}

/// Numbered move text with the result token, wrapped at 80 columns.
pub fn movetext(timeline: &Timeline) -> String {
    let mut words: Vec<String> = Vec::with_capacity(timeline.len() * 3 / 2 + 1);
    for pair in timeline.move_pairs() {
        if let Some(white) = pair.white {
            words.push(format!("{}. {white}", pair.number));
        }
        if let Some(black) = pair.black {
            words.push(black);
        }
    }
    words.push(result_token(timeline).to_string());

    let mut text = String::with_capacity(words.iter().map(|w| w.len() + 1).sum());
    let mut line_len = 0;
    for word in words {
        if line_len > 0 && line_len + 1 + word.len() > LINE_WIDTH {
            text.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            text.push(' ');
            line_len += 1;
        }
        line_len += word.len();
        text.push_str(&word);
    }
    text
}

fn result_token(timeline: &Timeline) -> &'static str {
    timeline
        .status()
        .winner()
        .map_or("*", |winner| winner.result_token())
}

fn escape_tag_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// =========================================================================
// Tests
// =========================================================================
