use indexmap::{IndexMap, IndexSet};

use crate::{
    board::{Board, Loc},
    catalog::{Catalog, TileId},
};

/// Live candidate tiles for every open cell that has not collapsed yet.
///
/// Iteration follows insertion order, which is the board's row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionBuffer {
    options: IndexMap<Loc, IndexSet<TileId>>,
}

// Construction.
impl OptionBuffer {
    /// Every open, empty cell starts with every candidate tile.
    pub fn seed(board: &Board, catalog: &Catalog) -> Self {
        let all = catalog.candidates().collect::<IndexSet<_>>();
        let options = board.open_locs()
            .filter(|&loc| board.tile(loc).is_none())
            .map(|loc| (loc, all.clone()))
            .collect();
        Self { options }
    }

    pub(crate) fn from_map(options: IndexMap<Loc, IndexSet<TileId>>) -> Self {
        Self { options }
    }
}

// Queries.
impl OptionBuffer {
    pub fn get(&self, loc: Loc) -> Option<&IndexSet<TileId>> {
        self.options.get(&loc)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Loc, &IndexSet<TileId>)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Cells left with exactly one candidate.
    pub fn singletons(&self) -> impl Iterator<Item = (Loc, TileId)> + '_ {
        self.options.iter()
            .filter(|(_, tiles)| tiles.len() == 1)
            .filter_map(|(&loc, tiles)| tiles.get_index(0).map(|&tile| (loc, tile)))
    }

    /// The most constrained cell. Ties go to the earliest cell.
    pub fn most_constrained(&self) -> Option<(Loc, &IndexSet<TileId>)> {
        self.options.iter()
            .min_by_key(|(_, tiles)| tiles.len())
            .map(|(&loc, tiles)| (loc, tiles))
    }

    /// Total number of candidates across all cells.
    pub fn weight(&self) -> usize {
        self.options.values().map(IndexSet::len).sum()
    }

    /// Every key is an open cell that still lacks a tile.
    pub fn is_consistent_with(&self, board: &Board) -> bool {
        self.options.keys().all(|&loc| {
            board.is_loc(loc) && !board.cell(loc).fixed && board.tile(loc).is_none()
        })
    }
}

// Mutation.
impl OptionBuffer {
    pub fn remove(&mut self, loc: Loc) -> Option<IndexSet<TileId>> {
        self.options.shift_remove(&loc)
    }
}
