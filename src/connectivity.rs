use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::{
    board::{Board, Loc},
    catalog::{Catalog, Direction},
};

/// Whether a walker can step from `from` towards `dir`. Both tiles must show an
/// open connector on the shared edge.
pub fn connects(board: &Board, catalog: &Catalog, from: Loc, dir: Direction) -> bool {
    let to = match board.step(from, dir) {
        Some(to) => to,
        None => return false,
    };
    match (board.tile(from), board.tile(to)) {
        (Some(a), Some(b)) => {
            catalog.signature(a).is_open(dir) && catalog.signature(b).is_open(dir.opposite())
        },
        // Unresolved cells are walls.
        _ => false,
    }
}

/// Breadth-first search from `start` to `goal` over open connectors.
///
/// Meant for a fully collapsed board; empty cells are treated as impassable.
pub fn reachable(board: &Board, catalog: &Catalog, start: Loc, goal: Loc) -> bool {
    if start == goal {
        return true;
    }
    let mut visited = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(loc) = queue.pop_front() {
        for (dir, next) in board.neighbors_of(loc) {
            if visited.contains(&next) || !connects(board, catalog, loc, dir) {
                continue;
            }
            if next == goal {
                return true;
            }
            visited.insert(next);
            queue.push_back(next);
        }
    }
    false
}
