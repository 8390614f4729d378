//! Fills a grid with edge-matched tiles by constraint propagation, then checks
//! whether the result links a start cell to a goal cell.
//!
//! A [`Solver`] owns the [`Board`]. Each open cell keeps a set of candidate
//! tiles in the [`OptionBuffer`]. Candidates are filtered against the
//! connectors of resolved neighbours, forced cells are committed, and when
//! nothing is forced the most constrained cell is resolved at random. Cells
//! that run out of candidates receive the catalog's fallback tile.

pub mod board;
pub mod catalog;
pub mod connectivity;
pub mod error;
pub mod level;
pub mod solver;

pub use board::{Board, Dim, Loc};
pub use catalog::{Catalog, Connector, Direction, Signature, TileId, TileSpec};
pub use error::Error;
pub use level::{Level, Preset};
pub use solver::{Report, SolveResult, Solver, Status, Step, options::OptionBuffer};

/// Seedable generator used for every random choice.
pub use rand_xoshiro::Xoshiro256PlusPlus as BaseRng;
