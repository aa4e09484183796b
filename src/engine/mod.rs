pub mod apply;
pub mod attacks;
pub mod board;
pub mod fen;
pub mod lan;
pub mod movegen;
pub mod notation;
pub mod pgn;
pub mod san;
pub mod status;
pub mod timeline;
pub mod types;

pub use apply::apply_move;
pub use attacks::is_square_attacked;
pub use board::{Position, RepetitionKey};
pub use fen::START_FEN;
pub use movegen::{is_legal, legal_moves, legal_moves_from};
pub use san::PromotionPolicy;
pub use status::{DrawReason, GameStatus, OutcomeTag, Winner};
pub use timeline::{AppendOutcome, BoardView, Cursor, MoveEvent, MovePair, Timeline, TimelineEntry};
pub use types::*;
