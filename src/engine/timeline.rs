//! The committed, gap-free move sequence of one game.
//!
//! A `Timeline` starts at the standard position and only ever grows by one
//! validated move at a time (or is replaced wholesale by a validated import).
//! Moves delivered out of order are held back until the missing indices
//! arrive, so entry *i* is always derived from entry *i − 1*.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::apply;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::notation;
use crate::engine::pgn;
use crate::engine::san;
use crate::engine::status::{self, GameStatus};
use crate::engine::types::{ChessError, Move, Square};

// =========================================================================
// Entries and events
// =========================================================================

/// One committed move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineEntry {
    /// 1-based position in the game.
    pub index: usize,
    pub mv: Move,
    /// Canonical SAN of `mv`.
    pub notation: String,
    /// FEN of the position after `mv`.
    pub fen: String,
    pub status: GameStatus,
}

/// A move as delivered by a peer or a feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    pub index: usize,
    pub notation: String,
    /// Position the sender claims the move leads to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

impl MoveEvent {
    pub fn new(index: usize, notation: impl Into<String>) -> Self {
        MoveEvent {
            index,
            notation: notation.into(),
            fen: None,
        }
    }

    pub fn with_fen(mut self, fen: impl Into<String>) -> Self {
        self.fen = Some(fen.into());
        self
    }
}

/// What [`Timeline::append`] did with an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The event (and any buffered successors) were committed; `committed`
    /// moves were added and the timeline now ends at `through`. Buffered
    /// events that failed validation while draining are listed in `rejected`
    /// and dropped.
    Committed {
        through: usize,
        committed: usize,
        rejected: Vec<(usize, ChessError)>,
    },
    /// The index is already committed; nothing changed.
    Duplicate { index: usize },
    /// The index is ahead of the timeline; held until the gap fills.
    Buffered { index: usize, pending: usize },
}

// =========================================================================
// Timeline
// =========================================================================

#[derive(Clone, Debug)]
pub struct Timeline {
    config: EngineConfig,
    /// `positions[i]` is the position after move `i`; `positions[0]` is the start.
    positions: Vec<Position>,
    entries: Vec<TimelineEntry>,
    pending: BTreeMap<usize, MoveEvent>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Timeline {
            config,
            positions: vec![Position::starting()],
            entries: Vec::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of committed moves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Entry `index` (1-based).
    pub fn entry(&self, index: usize) -> Option<&TimelineEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Position after the last committed move.
    pub fn tip(&self) -> &Position {
        // `positions` always holds at least the start position.
        &self.positions[self.entries.len()]
    }

    /// Status after the last committed move.
    pub fn status(&self) -> GameStatus {
        self.entries
            .last()
            .map_or(GameStatus::Ongoing { in_check: false }, |e| e.status)
    }

    /// Number of events waiting for an earlier index.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // -----------------------------------------------------------------------
    // Growing the timeline
    // -----------------------------------------------------------------------

    /// Play a move on the tip (local input).
    ///
    /// Buffered events that this move unblocks are committed too. One that
    /// fails validation is dropped with a warning; use [`Timeline::append`]
    /// to receive those failures.
    pub fn play(&mut self, text: &str) -> Result<&TimelineEntry, ChessError> {
        let index = self.len() + 1;
        self.commit(&MoveEvent::new(index, text))?;
        self.drain_pending();
        Ok(&self.entries[index - 1])
    }

    /// Deliver one event from a possibly unordered source.
    ///
    /// The move is always re-derived from its notation against the committed
    /// position before it. A supplied FEN must agree with the derived position
    /// or the event is refused with [`ChessError::TimelineConflict`].
    pub fn append(&mut self, event: MoveEvent) -> Result<AppendOutcome, ChessError> {
        let len = self.len();
        let index = event.index;

        if index == 0 {
            return Err(ChessError::TimelineConflict {
                index,
                reason: "move indices start at 1".into(),
            });
        }

        if index <= len {
            self.check_duplicate(&event);
            return Ok(AppendOutcome::Duplicate { index });
        }

        if index > len + 1 {
            let limit = self.config.max_pending_appends;
            if !self.pending.contains_key(&index) && self.pending.len() >= limit {
                warn!(index, len, "out-of-order backlog full, refusing move");
                return Err(ChessError::BacklogFull { limit });
            }
            self.pending.entry(index).or_insert(event);
            debug!(index, len, pending = self.pending.len(), "buffered out-of-order move");
            return Ok(AppendOutcome::Buffered {
                index,
                pending: self.pending.len(),
            });
        }

        self.commit(&event)?;
        let rejected = self.drain_pending();
        Ok(AppendOutcome::Committed {
            through: self.len(),
            committed: self.len() - len,
            rejected,
        })
    }

    /// Commit every buffered event that now extends the tip, in index order.
    fn drain_pending(&mut self) -> Vec<(usize, ChessError)> {
        let mut rejected = Vec::new();
        // Anything at or below the tip can no longer apply.
        let stale: Vec<usize> = self.pending.range(..=self.len()).map(|(&i, _)| i).collect();
        for index in stale {
            if let Some(event) = self.pending.remove(&index) {
                self.check_duplicate(&event);
            }
        }

        while let Some(event) = self.pending.remove(&(self.len() + 1)) {
            if let Err(err) = self.commit(&event) {
                warn!(
                    index = event.index,
                    notation = %event.notation,
                    error = %err,
                    "dropping buffered move"
                );
                rejected.push((event.index, err));
                break;
            }
        }
        rejected
    }

    /// Log a duplicate that disagrees with what is already committed.
    fn check_duplicate(&self, event: &MoveEvent) {
        let Some(entry) = self.entry(event.index) else {
            return;
        };
        let prior = &self.positions[event.index - 1];
        let same_move = notation::parse_move(prior, &event.notation, self.config.promotion)
            .is_ok_and(|mv| mv == entry.mv);
        let same_fen = event.fen.as_ref().is_none_or(|fen| *fen == entry.fen);
        if same_move && same_fen {
            debug!(index = event.index, "ignoring duplicate move");
        } else {
            warn!(
                index = event.index,
                notation = %event.notation,
                committed = %entry.notation,
                "ignoring duplicate that conflicts with the committed move"
            );
        }
    }

    /// Validate `event` against the tip and push it.
    fn commit(&mut self, event: &MoveEvent) -> Result<(), ChessError> {
        let tip = self.tip();
        let mv = notation::parse_move(tip, &event.notation, self.config.promotion)?;
        let next = apply::apply_move(tip, mv)?;

        if let Some(fen) = &event.fen {
            let claimed = Position::from_fen(fen)?;
            if claimed != next {
                warn!(index = event.index, claimed = %fen, derived = %next, "move leads elsewhere");
                return Err(ChessError::TimelineConflict {
                    index: event.index,
                    reason: format!("expected {next}, got {fen}"),
                });
            }
        }

        let notation = san::to_san_with(tip, mv, &movegen::legal_moves(tip));
        self.push(mv, notation, next);
        let entry = &self.entries[self.entries.len() - 1];
        debug!(index = entry.index, notation = %entry.notation, status = %entry.status, "committed move");
        Ok(())
    }

    fn push(&mut self, mv: Move, notation: String, position: Position) {
        let legal = movegen::legal_moves(&position);
        let status = status::classify(&position, &self.positions, &legal);
        self.entries.push(TimelineEntry {
            index: self.entries.len() + 1,
            mv,
            notation,
            fen: position.to_fen(),
            status,
        });
        self.positions.push(position);
    }

    /// Swap in a whole new chain, validated from the start before anything
    /// changes. Events must be numbered 1, 2, 3, … in order.
    pub fn replace(&mut self, events: &[MoveEvent]) -> Result<(), ChessError> {
        let mut fresh = Timeline::with_config(self.config.clone());
        for (i, event) in events.iter().enumerate() {
            let transcript_err = |source: ChessError| ChessError::Transcript {
                ply: i + 1,
                token: event.notation.clone(),
                source: Box::new(source),
            };
            if event.index != i + 1 {
                return Err(transcript_err(ChessError::TimelineConflict {
                    index: event.index,
                    reason: format!("expected index {}", i + 1),
                }));
            }
            fresh.commit(event).map_err(transcript_err)?;
        }
        debug!(len = fresh.len(), "replaced timeline");
        *self = fresh;
        Ok(())
    }

    /// Parse PGN move text and replace the timeline with it.
    pub fn import(&mut self, movetext: &str) -> Result<(), ChessError> {
        let parsed = pgn::parse_movetext(movetext, self.config.promotion)?;
        let mut fresh = Timeline::with_config(self.config.clone());
        for m in parsed {
            fresh.push(m.mv, m.notation, m.position);
        }
        debug!(len = fresh.len(), "imported timeline");
        *self = fresh;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reading the timeline
    // -----------------------------------------------------------------------

    /// Position after move `index`; 0 is the starting position.
    pub fn navigate(&self, index: usize) -> Result<&Position, ChessError> {
        self.positions.get(index).ok_or(ChessError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Everything a board widget needs to show move `index`.
    pub fn view(&self, index: usize) -> Result<BoardView, ChessError> {
        let position = self.navigate(index)?;
        let entry = self.entry(index);
        Ok(BoardView {
            index,
            total: self.len(),
            fen: position.to_fen(),
            last_move: entry.map(|e| (e.mv.from, e.mv.to)),
            notation: entry.map(|e| e.notation.clone()),
            status: entry.map_or(GameStatus::Ongoing { in_check: false }, |e| e.status),
        })
    }

    /// A cursor parked on the last move.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.len(), self.len())
    }

    /// Moves grouped into numbered white/black rows.
    pub fn move_pairs(&self) -> Vec<MovePair> {
        self.entries
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| MovePair {
                number: i + 1,
                white: pair.first().map(|e| e.notation.clone()),
                black: pair.get(1).map(|e| e.notation.clone()),
            })
            .collect()
    }
}

/// Snapshot of one point in the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardView {
    pub index: usize,
    pub total: usize,
    pub fen: String,
    /// Origin and destination of the move that led here.
    pub last_move: Option<(Square, Square)>,
    pub notation: Option<String>,
    pub status: GameStatus,
}

impl BoardView {
    /// "3 of 10"; the start position reads "0 of 10".
    pub fn label(&self) -> String {
        format!("{} of {}", self.index, self.total)
    }
}

/// One numbered row of a move list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: usize,
    pub white: Option<String>,
    pub black: Option<String>,
}

/// View-only position within a timeline of `len` moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    /// Clamps `index` into `0..=len`.
    pub fn new(index: usize, len: usize) -> Self {
        Cursor {
            index: index.min(len),
            len,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn first(self) -> Self {
        Cursor { index: 0, ..self }
    }

    pub fn prev(self) -> Self {
        Cursor {
            index: self.index.saturating_sub(1),
            ..self
        }
    }

    pub fn next(self) -> Self {
        Cursor {
            index: (self.index + 1).min(self.len),
            ..self
        }
    }

    pub fn last(self) -> Self {
        Cursor {
            index: self.len,
            ..self
        }
    }

    pub fn at_start(&self) -> bool {
        self.index == 0
    }

    pub fn at_end(&self) -> bool {
        self.index == self.len
    }
}

// =========================================================================
// Tests
// =========================================================================
