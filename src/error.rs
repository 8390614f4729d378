use thiserror::Error;

use crate::board::Loc;

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            return Err($e);
        }
    };
}

/// Everything that can go wrong while configuring or driving a solve.
///
/// Dead-ends are not errors. They are recovered with the fallback tile and
/// show up in [`SolveResult::fallbacks`](crate::solver::SolveResult).
#[derive(Debug, Error)]
pub enum Error {
    // Catalog configuration
    #[error("tile `{0}` is defined more than once")]
    DuplicateTile(String),
    #[error("signature `{0}` must have exactly four connectors")]
    MalformedSignature(String),
    #[error("unknown tile `{0}`")]
    UnknownTile(String),

    // Level configuration
    #[error("grid must be at least 1x1")]
    EmptyGrid,
    #[error("layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("{what} {loc:?} lies outside the {}x{} grid", .dims.0, .dims.1)]
    OutOfBounds {
        what: &'static str,
        loc: Loc,
        dims: (usize, usize),
    },

    // Broken solver invariants
    #[error("cell {0:?} is fixed and cannot be changed")]
    FixedCell(Loc),
    #[error("cell {0:?} already holds a tile")]
    AlreadySet(Loc),

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
