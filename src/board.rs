use itertools::Itertools;

use crate::{
    catalog::{Catalog, Connector, Direction, TileId},
    ensure,
    error::Error,
};

// Looking only north and east visits every shared edge once.
static FORWARD: [Direction; 2] = [Direction::North, Direction::East];

/// Grid coordinate as `(x, y)`.
pub type Loc = (usize, usize);

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct Cell {
    pub fixed: bool,
    pub tile: Option<TileId>,
}

impl Cell {
    fn fixed(tile: TileId) -> Self {
        Self {
            fixed: true,
            tile: Some(tile),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Dim {
    Square(usize),
    Rect(usize, usize),
}

impl Dim {
    fn w(&self) -> usize {
        match self {
            Dim::Square(n) => *n,
            Dim::Rect(n, _) => *n,
        }
    }
    fn h(&self) -> usize {
        match self {
            Dim::Square(n) => *n,
            Dim::Rect(_, n) => *n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    // Rows indexed by y, so `cells[y][x]`.
    cells: Box<[Box<[Cell]>]>,
    dims: (usize, usize),
}

// Helpers
impl Board {
    pub fn is_loc(&self, (x, y): Loc) -> bool {
        (0..self.dims.0).contains(&x) && (0..self.dims.1).contains(&y)
    }

    /// The in-bounds cell one step from `loc` in `dir`.
    pub fn step(&self, (x, y): Loc, dir: Direction) -> Option<Loc> {
        let (dx, dy) = dir.offset();
        let nx = (x as isize).checked_add(dx)?;
        let ny = (y as isize).checked_add(dy)?;
        if nx < 0 || ny < 0 {
            return None;
        }
        let next = (nx as usize, ny as usize);
        if self.is_loc(next) {
            Some(next)
        } else {
            None
        }
    }

    pub fn neighbors_of(&self, loc: Loc) -> impl Iterator<Item = (Direction, Loc)> + '_ {
        Direction::ALL.iter()
            .filter_map(move |&dir| self.step(loc, dir).map(|n| (dir, n)))
    }

    /// Every location in row-major order, south row first.
    pub fn all_locs(&self) -> impl Iterator<Item = Loc> {
        (0..self.dims.1).cartesian_product(0..self.dims.0).map(|(y, x)| (x, y))
    }

    pub fn open_locs(&self) -> impl Iterator<Item = Loc> + '_ {
        self.all_locs().filter(move |&loc| !self.cell(loc).fixed)
    }

    pub fn cell(&self, (x, y): Loc) -> &Cell {
        &self.cells[y][x]
    }

    pub fn tile(&self, loc: Loc) -> Option<TileId> {
        self.cell(loc).tile
    }

    pub fn is_collapsed(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|c| c.tile.is_some()))
    }

    pub fn w(&self) -> usize {
        self.dims.0
    }

    pub fn h(&self) -> usize {
        self.dims.1
    }

    pub fn dims(&self) -> (usize, usize) {
        self.dims
    }

    pub(crate) fn check_loc(&self, what: &'static str, loc: Loc) -> Result<(), Error> {
        ensure!(self.is_loc(loc), Error::OutOfBounds { what, loc, dims: self.dims });
        Ok(())
    }
}

// Constructors
impl Board {
    pub fn new<I>(dim: Dim, fixed: I) -> Result<Self, Error> where I: IntoIterator<Item = (Loc, TileId)> {
        let (w, h) = (dim.w(), dim.h());
        ensure!(w != 0 && h != 0, Error::EmptyGrid);
        let cells = vec![vec![Cell::default(); w]; h]
            .into_iter()
            .map(|v| v.into_boxed_slice())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let mut board = Self {
            cells,
            dims: (w, h),
        };

        for (loc, tile) in fixed {
            board.check_loc("fixed cell", loc)?;
            board.cells[loc.1][loc.0] = Cell::fixed(tile);
        }

        Ok(board)
    }

    /// Parses a text layout, north row first. Tokens are separated by
    /// whitespace; `.` is an open cell, anything else names a fixed tile.
    pub fn from_layout<S: AsRef<str>>(rows: &[S], catalog: &Catalog) -> Result<Self, Error> {
        let h = rows.len();
        let w = rows.first().map_or(0, |r| r.as_ref().split_whitespace().count());
        let mut fixed = vec![];
        for (row, line) in rows.iter().enumerate() {
            let tokens = line.as_ref().split_whitespace().collect::<Vec<_>>();
            ensure!(tokens.len() == w, Error::RaggedLayout {
                row,
                found: tokens.len(),
                expected: w,
            });
            let y = h - 1 - row;
            for (x, token) in tokens.into_iter().enumerate() {
                if token == "." {
                    continue;
                }
                let tile = catalog.lookup(token)
                    .ok_or_else(|| Error::UnknownTile(token.to_owned()))?;
                fixed.push(((x, y), tile));
            }
        }

        Self::new(Dim::Rect(w, h), fixed)
    }
}

// Reading and writing tiles.
impl Board {
    /// The connector the neighbour in `dir` shows back towards `loc`, if that
    /// neighbour exists and holds a tile.
    pub fn neighbor_connector(&self, loc: Loc, dir: Direction, catalog: &Catalog) -> Option<Connector> {
        let neighbor = self.step(loc, dir)?;
        let tile = self.tile(neighbor)?;
        Some(catalog.signature(tile).edge(dir.opposite()))
    }

    /// Each shared edge whose two placed tiles show different connectors,
    /// reported once from its south or west cell.
    pub fn mismatched_edges<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = (Loc, Direction)> + 'a {
        self.all_locs()
            .cartesian_product(FORWARD.iter().copied())
            .filter(move |&(loc, dir)| {
                match (self.tile(loc), self.neighbor_connector(loc, dir, catalog)) {
                    (Some(tile), Some(theirs)) => catalog.signature(tile).edge(dir) != theirs,
                    _ => false,
                }
            })
    }

    pub fn set_tile(&mut self, loc: Loc, tile: TileId) -> Result<(), Error> {
        self.check_loc("tile placement", loc)?;
        let cell = &mut self.cells[loc.1][loc.0];
        ensure!(!cell.fixed, Error::FixedCell(loc));
        ensure!(cell.tile.is_none(), Error::AlreadySet(loc));
        cell.tile = Some(tile);
        Ok(())
    }

    /// Empties every cell that was not fixed at construction.
    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut().filter(|c| !c.fixed) {
                cell.tile = None;
            }
        }
    }
}

impl Board {
    /// Character snapshot of the board, north row first.
    pub fn display<F>(&self, glyph: F) -> Box<[Box<[char]>]> where F: Fn(Loc, &Cell) -> char {
        (0..self.dims.1)
            .rev()
            .map(|y| {
                (0..self.dims.0)
                    .map(|x| glyph((x, y), &self.cells[y][x]))
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            })
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }
}
