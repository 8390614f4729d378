use tracing::trace;

use crate::{
    board::{Board, Loc},
    catalog::{Catalog, Direction, TileId},
    solver::options::OptionBuffer,
};

/// One propagation pass.
///
/// Every cell is filtered against the connectors its resolved neighbours
/// expose. The result is a fresh buffer, computed entirely from `buffer` as it
/// stood before the pass.
pub fn propagate(buffer: &OptionBuffer, board: &Board, catalog: &Catalog) -> OptionBuffer {
    let options = buffer.iter()
        .map(|(&loc, tiles)| {
            let mut kept = tiles.clone();
            for &dir in Direction::ALL.iter() {
                if let Some(wanted) = board.neighbor_connector(loc, dir, catalog) {
                    kept.retain(|&tile| catalog.signature(tile).edge(dir) == wanted);
                }
            }
            if kept.len() != tiles.len() {
                trace!(?loc, before = tiles.len(), after = kept.len(), "narrowed options");
            }
            (loc, kept)
        })
        .collect();
    OptionBuffer::from_map(options)
}

/// Repeats [`propagate`] until a pass removes nothing. Returns the settled
/// buffer and the number of passes that changed something.
pub fn propagate_to_fixpoint(buffer: &OptionBuffer, board: &Board, catalog: &Catalog) -> (OptionBuffer, usize) {
    let mut current = propagate(buffer, board, catalog);
    let mut passes = 0;
    if current != *buffer {
        passes += 1;
    }
    loop {
        let next = propagate(&current, board, catalog);
        if next == current {
            return (current, passes);
        }
        passes += 1;
        current = next;
    }
}

/// Whether `tile` agrees with every resolved neighbour of `loc`.
pub fn fits(board: &Board, catalog: &Catalog, loc: Loc, tile: TileId) -> bool {
    Direction::ALL.iter().all(|&dir| {
        board.neighbor_connector(loc, dir, catalog)
            .map_or(true, |wanted| catalog.signature(tile).edge(dir) == wanted)
    })
}
