//! Pre-computed step and ray tables plus square-attack detection.
//!
//! All tables are initialised once (via `OnceLock`) and live for the lifetime
//! of the process. Sliding attacks walk the pre-computed rays and stop at the
//! first occupied square.

use std::sync::OnceLock;

use crate::engine::board::Position;
use crate::engine::types::{Color, Piece, PieceKind, Square};

// =========================================================================
// Directions
// =========================================================================

/// (file, rank) deltas for the eight ray directions. The first four are
/// orthogonal, the last four diagonal.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

pub const ORTHOGONAL: std::ops::Range<usize> = 0..4;
pub const DIAGONAL: std::ops::Range<usize> = 4..8;
pub const ALL_DIRECTIONS: std::ops::Range<usize> = 0..8;

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

// =========================================================================
// Tables
// =========================================================================

/// Get a reference to the global attack tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// Target squares for leapers and rays for sliders, indexed by square.
pub struct AttackTables {
    knight: Vec<Vec<Square>>,
    king: Vec<Vec<Square>>,
    /// `rays[square][direction]`, nearest square first.
    rays: Vec<[Vec<Square>; 8]>,
}

impl AttackTables {
    fn init() -> Self {
        let leaps = |steps: &[(i8, i8)]| -> Vec<Vec<Square>> {
            Square::all()
                .map(|sq| {
                    steps
                        .iter()
                        .filter_map(|&(df, dr)| sq.offset(df, dr))
                        .collect()
                })
                .collect()
        };

        let rays = Square::all()
            .map(|sq| {
                DIRECTIONS.map(|(df, dr)| {
                    let mut ray = Vec::with_capacity(7);
                    let mut cur = sq;
                    while let Some(next) = cur.offset(df, dr) {
                        ray.push(next);
                        cur = next;
                    }
                    ray
                })
            })
            .collect();

        AttackTables {
            knight: leaps(&KNIGHT_STEPS),
            king: leaps(&DIRECTIONS),
            rays,
        }
    }

    #[inline]
    pub fn knight_targets(&self, sq: Square) -> &[Square] {
        &self.knight[sq.index()]
    }

    #[inline]
    pub fn king_targets(&self, sq: Square) -> &[Square] {
        &self.king[sq.index()]
    }

    #[inline]
    pub fn ray(&self, sq: Square, direction: usize) -> &[Square] {
        &self.rays[sq.index()][direction]
    }
}

// =========================================================================
// Attack detection
// =========================================================================

/// Is `sq` attacked by any piece of colour `by` in `pos`?
///
/// Works purely from the placement, so it also answers the question for a
/// hypothetical successor position during legality filtering.
pub fn is_square_attacked(pos: &Position, sq: Square, by: Color) -> bool {
    let t = tables();
    let holds = |target: Square, kinds: &[PieceKind]| {
        matches!(pos.piece_at(target), Some(Piece { kind, color }) if color == by && kinds.contains(&kind))
    };

    // A pawn of `by` attacks `sq` from one rank behind it (from `by`'s view).
    let behind = -by.forward();
    for df in [-1, 1] {
        if let Some(from) = sq.offset(df, behind)
            && holds(from, &[PieceKind::Pawn])
        {
            return true;
        }
    }

    if t.knight_targets(sq)
        .iter()
        .any(|&from| holds(from, &[PieceKind::Knight]))
    {
        return true;
    }

    if t.king_targets(sq)
        .iter()
        .any(|&from| holds(from, &[PieceKind::King]))
    {
        return true;
    }

    for direction in ALL_DIRECTIONS {
        let sliders: &[PieceKind] = if ORTHOGONAL.contains(&direction) {
            &[PieceKind::Rook, PieceKind::Queen]
        } else {
            &[PieceKind::Bishop, PieceKind::Queen]
        };
        if let Some(&blocker) = t
            .ray(sq, direction)
            .iter()
            .find(|&&s| pos.piece_at(s).is_some())
            && holds(blocker, sliders)
        {
            return true;
        }
    }

    false
}

// =========================================================================
// Tests
// =========================================================================
