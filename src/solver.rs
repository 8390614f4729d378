pub mod options;
pub mod propagate;

use std::sync::Arc;

use indexmap::IndexSet;
use rand::{Rng, RngCore, SeedableRng, rngs::OsRng};
use rand_xoshiro::Xoshiro256PlusPlus as BaseRng;
use tracing::{debug, info, warn};

use crate::{
    board::{Board, Loc},
    catalog::{Catalog, TileId},
    connectivity,
    error::Error,
    level::Level,
};

use self::{options::OptionBuffer, propagate::propagate_to_fixpoint};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Status {
    Solving,
    Done,
}

/// What a single [`Solver::collapse_step`] did.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Step {
    /// Committed this many forced (single candidate) cells and nothing else
    /// was left to do.
    Forced(usize),
    /// Picked a tile at random for the most constrained cell.
    Chose { loc: Loc, tile: TileId },
    /// The most constrained cell had no candidates left.
    Fallback { loc: Loc },
    Done,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SolveResult {
    /// `true` when every open cell received a tile without falling back and
    /// every pair of neighbours agrees on their shared edge.
    pub success: bool,
    /// Whether the goal can be reached from the start.
    pub reachable: bool,
    /// Cells that ran out of candidates and received the fallback tile.
    pub fallbacks: Vec<Loc>,
    /// Random or fallback choices needed to finish the board.
    pub steps: usize,
}

impl SolveResult {
    pub fn is_degraded(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

/// Receives the verdict once a board has been fully collapsed.
pub trait Report {
    fn report(&mut self, result: &SolveResult);
}

impl<F> Report for F where F: FnMut(&SolveResult) {
    fn report(&mut self, result: &SolveResult) {
        self(result)
    }
}

/// Owns the board and its option buffer, and drives them to a full collapse.
pub struct Solver {
    board: Board,
    catalog: Arc<Catalog>,
    options: OptionBuffer,
    rng: BaseRng,
    start: Loc,
    goal: Loc,
    status: Status,
    fallbacks: Vec<Loc>,
    steps: usize,
}

// Construction.
impl Solver {
    pub fn new(level: &Level, catalog: Arc<Catalog>, rng: BaseRng) -> Result<Self, Error> {
        let board = Board::from_layout(&level.layout, &catalog)?;
        Self::with_board(board, catalog, level.start, level.goal, rng)
    }

    pub fn from_entropy(level: &Level, catalog: Arc<Catalog>) -> Result<Self, Error> {
        let mut seed = [0; 32];
        OsRng.fill_bytes(&mut seed);
        Self::new(level, catalog, BaseRng::from_seed(seed))
    }

    pub fn with_board(board: Board, catalog: Arc<Catalog>, start: Loc, goal: Loc, rng: BaseRng) -> Result<Self, Error> {
        board.check_loc("start", start)?;
        board.check_loc("goal", goal)?;
        let options = OptionBuffer::seed(&board, &catalog);
        let mut solver = Self {
            board,
            catalog,
            options,
            rng,
            start,
            goal,
            status: Status::Solving,
            fallbacks: vec![],
            steps: 0,
        };
        solver.propagate();
        solver.refresh_status();
        Ok(solver)
    }
}

// Accessors.
impl Solver {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &OptionBuffer {
        &self.options
    }

    /// Candidate count of an unresolved cell.
    pub fn options_at(&self, loc: Loc) -> Option<usize> {
        self.options.get(loc).map(IndexSet::len)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn fallbacks(&self) -> &[Loc] {
        &self.fallbacks
    }

    pub fn endpoints(&self) -> (Loc, Loc) {
        (self.start, self.goal)
    }
}

// Single phases, exposed for hosts that animate a solve.
impl Solver {
    /// Narrows the whole buffer against the placed tiles until nothing
    /// more can be removed.
    pub fn propagate(&mut self) {
        let (settled, _) = propagate_to_fixpoint(&self.options, &self.board, &self.catalog);
        self.options = settled;
    }

    /// Commits every forced cell, propagating after each round of commits,
    /// until a round commits nothing. Returns how many cells were committed.
    pub fn collapse_pass(&mut self) -> Result<usize, Error> {
        let mut committed = 0;
        loop {
            self.propagate();
            let forced = self.options.singletons().collect::<Vec<_>>();
            if forced.is_empty() {
                break;
            }
            committed += forced.len();
            for (loc, tile) in forced {
                self.commit(loc, tile)?;
            }
        }
        self.refresh_status();
        Ok(committed)
    }

    /// Resolves the most constrained cell by a random pick, or by the
    /// fallback tile when nothing fits. The buffer is settled first, so the
    /// pick always agrees with tiles placed since the last pass. Does nothing
    /// once the board is done.
    pub fn forced_choice(&mut self) -> Result<Option<(Loc, Option<TileId>)>, Error> {
        self.propagate();
        let (loc, picked) = match self.options.most_constrained() {
            Some((loc, tiles)) if tiles.is_empty() => (loc, None),
            Some((loc, tiles)) => {
                let i = self.rng.gen_range(0, tiles.len());
                (loc, tiles.get_index(i).copied())
            },
            None => return Ok(None),
        };
        self.steps += 1;
        match picked {
            Some(tile) => {
                debug!(?loc, tile = self.catalog.name(tile), "chose tile");
                debug_assert!(propagate::fits(&self.board, &self.catalog, loc, tile));
                self.commit(loc, tile)?;
            },
            None => {
                let fallback = self.catalog.fallback();
                warn!(?loc, fallback = self.catalog.name(fallback), "no options left, using fallback");
                self.commit(loc, fallback)?;
                self.fallbacks.push(loc);
            },
        }
        self.refresh_status();
        Ok(Some((loc, picked)))
    }

    /// One iteration of the solve loop: a collapse pass, then a single
    /// forced choice if nothing was forced and cells remain.
    pub fn collapse_step(&mut self) -> Result<Step, Error> {
        if self.status == Status::Done {
            return Ok(Step::Done);
        }
        let forced = self.collapse_pass()?;
        if forced != 0 || self.status == Status::Done {
            return Ok(Step::Forced(forced));
        }
        Ok(match self.forced_choice()? {
            Some((loc, Some(tile))) => Step::Chose { loc, tile },
            Some((loc, None)) => Step::Fallback { loc },
            None => Step::Done,
        })
    }

    /// Resets every open cell and rebuilds the option buffer.
    pub fn clear(&mut self) {
        self.board.clear();
        self.options = OptionBuffer::seed(&self.board, &self.catalog);
        self.fallbacks.clear();
        self.steps = 0;
        self.propagate();
        self.refresh_status();
    }
}

// Full solves.
impl Solver {
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn solve(&mut self) -> Result<SolveResult, Error> {
        while self.status == Status::Solving {
            self.collapse_step()?;
        }
        let result = self.evaluate();
        info!(
            success = result.success,
            reachable = result.reachable,
            steps = result.steps,
            fallbacks = result.fallbacks.len(),
            "board solved"
        );
        Ok(result)
    }

    pub fn clear_and_resolve(&mut self) -> Result<SolveResult, Error> {
        self.clear();
        self.solve()
    }

    /// Solves and hands the verdict to `sink`.
    pub fn solve_and_report<R: Report>(&mut self, sink: &mut R) -> Result<SolveResult, Error> {
        let result = self.solve()?;
        sink.report(&result);
        Ok(result)
    }

    /// The verdict for the current board. Only meaningful once the board is
    /// fully collapsed.
    pub fn evaluate(&self) -> SolveResult {
        let mismatched = self.board.mismatched_edges(&self.catalog).count();
        if mismatched != 0 {
            warn!(mismatched, "neighbouring tiles disagree");
        }
        SolveResult {
            success: self.status == Status::Done && self.fallbacks.is_empty() && mismatched == 0,
            reachable: connectivity::reachable(&self.board, &self.catalog, self.start, self.goal),
            fallbacks: self.fallbacks.clone(),
            steps: self.steps,
        }
    }
}

// Internals.
impl Solver {
    fn commit(&mut self, loc: Loc, tile: TileId) -> Result<(), Error> {
        self.board.set_tile(loc, tile)?;
        self.options.remove(loc);
        debug_assert!(self.options.is_consistent_with(&self.board));
        Ok(())
    }

    fn refresh_status(&mut self) {
        self.status = if self.options.is_empty() {
            Status::Done
        } else {
            Status::Solving
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{catalog::{Direction, TileSpec}, level::Preset};
    use test_case::test_case;

    fn rng(seed: u64) -> BaseRng {
        BaseRng::seed_from_u64(seed)
    }

    fn solver(level: &Level, seed: u64) -> Solver {
        let catalog = Arc::new(level.catalog().expect("level catalog to be valid."));
        Solver::new(level, catalog, rng(seed)).expect("level to be valid.")
    }

    fn level(layout: &[&str], start: Loc, goal: Loc) -> Level {
        Level {
            tiles: None,
            fallback: None,
            layout: layout.iter().map(|r| r.to_string()).collect(),
            start,
            goal,
        }
    }

    fn with_tiles(mut level: Level, tiles: Vec<TileSpec>, fallback: &str) -> Level {
        level.tiles = Some(tiles);
        level.fallback = Some(fallback.to_owned());
        level
    }

    fn tiles(solver: &Solver) -> Vec<Option<TileId>> {
        solver.board().all_locs().map(|l| solver.board().tile(l)).collect()
    }

    #[test]
    fn single_open_tile_fills_everything() {
        let level = with_tiles(
            level(&[". . .", ". . .", ". . ."], (1, 1), (0, 0)),
            vec![TileSpec::new("1111", "1111"), TileSpec::reserved("0000", "0000")],
            "0000",
        );
        let mut solver = solver(&level, 0);
        let result = solver.solve().unwrap();

        let cross = solver.catalog().lookup("1111");
        assert!(solver.board().all_locs().all(|l| solver.board().tile(l) == cross));
        assert_eq!(result, SolveResult {
            success: true,
            reachable: true,
            fallbacks: vec![],
            steps: 0,
        });
    }

    #[test]
    fn dead_ends_fall_back_without_failing() {
        let level = with_tiles(
            level(&[". . .", "0101 . .", ". 1010 ."], (0, 1), (1, 0)),
            vec![
                TileSpec::new("1010", "1010"),
                TileSpec::new("0101", "0101"),
                TileSpec::reserved("grass", "0000"),
            ],
            "grass",
        );
        let mut solver = solver(&level, 3);
        assert_eq!(solver.options_at((1, 1)), Some(0));

        let result = solver.solve().unwrap();
        assert!(solver.board().is_collapsed());
        assert!(!result.success);
        assert!(result.is_degraded());
        assert!(result.fallbacks.contains(&(1, 1)));
        let grass = solver.catalog().fallback();
        for &loc in &result.fallbacks {
            assert_eq!(solver.board().tile(loc), Some(grass));
        }
        assert_eq!(solver.fallbacks(), &result.fallbacks[..]);
    }

    #[test_case(Preset::Small; "small")]
    #[test_case(Preset::Medium; "medium")]
    #[test_case(Preset::Large; "large")]
    fn standard_tiles_always_match(preset: Preset) {
        let level = Level::preset(preset);
        let mut solver = solver(&level, 11);
        let open = solver.board().open_locs().count();
        let result = solver.solve().unwrap();

        assert!(result.success);
        assert!(result.steps <= open);
        assert_eq!(solver.status(), Status::Done);
        assert!(solver.options().is_empty());

        let board = solver.board();
        let catalog = solver.catalog();
        for loc in board.all_locs() {
            let here = catalog.signature(board.tile(loc).unwrap());
            for (dir, next) in board.neighbors_of(loc) {
                let there = catalog.signature(board.tile(next).unwrap());
                assert_eq!(here.edge(dir), there.edge(dir.opposite()));
            }
        }
    }

    #[test]
    fn fixed_cells_survive_solves() {
        let level = Level::medium();
        let mut solver = solver(&level, 5);
        let fixed = solver.board().all_locs()
            .filter(|&l| solver.board().cell(l).fixed)
            .map(|l| (l, solver.board().tile(l)))
            .collect::<Vec<_>>();
        assert_eq!(fixed.len(), 2);

        solver.solve().unwrap();
        solver.clear_and_resolve().unwrap();
        for (loc, tile) in fixed {
            assert!(solver.board().cell(loc).fixed);
            assert_eq!(solver.board().tile(loc), tile);
        }
    }

    #[test]
    fn same_seed_same_board() {
        let level = Level::large();
        let mut a = solver(&level, 42);
        let mut b = solver(&level, 42);
        assert_eq!(a.solve().unwrap(), b.solve().unwrap());
        assert_eq!(tiles(&a), tiles(&b));
    }

    #[test]
    fn stepping_matches_solving() {
        let level = Level::medium();
        let mut stepped = solver(&level, 9);
        let mut solved = solver(&level, 9);

        let mut steps = 0;
        loop {
            match stepped.collapse_step().unwrap() {
                Step::Done => break,
                Step::Forced(n) => assert!(n > 0 || stepped.status() == Status::Done),
                Step::Chose { loc, tile } => {
                    assert_eq!(stepped.board().tile(loc), Some(tile));
                    assert!(stepped.options_at(loc).is_none());
                },
                Step::Fallback { .. } => panic!("the standard set never dead-ends."),
            }
            steps += 1;
            assert!(steps <= 64 * 2);
        }
        solved.solve().unwrap();
        assert_eq!(tiles(&stepped), tiles(&solved));
        assert_eq!(stepped.evaluate(), solved.evaluate());
    }

    #[test]
    fn forced_pass_commits_chains() {
        // A 1-wide corridor of straight pipes is forced end to end by the
        // fixed endpoints.
        let level = with_tiles(
            level(&["0100 . . . 0001"], (0, 0), (4, 0)),
            vec![
                TileSpec::new("0101", "0101"),
                TileSpec::reserved("0100", "0100"),
                TileSpec::reserved("0001", "0001"),
                TileSpec::reserved("0000", "0000"),
            ],
            "0000",
        );
        let mut solver = solver(&level, 1);
        assert_eq!(solver.collapse_pass().unwrap(), 3);
        assert_eq!(solver.status(), Status::Done);
        assert_eq!(solver.forced_choice().unwrap(), None);
        assert_eq!(solver.collapse_step().unwrap(), Step::Done);
        let result = solver.evaluate();
        assert!(result.success);
        assert!(result.reachable);
    }

    #[test]
    fn clear_reopens_the_board() {
        let level = Level::small();
        let mut solver = solver(&level, 2);
        solver.solve().unwrap();
        solver.clear();

        assert_eq!(solver.status(), Status::Solving);
        assert_eq!(solver.options().len(), 23);
        assert!(solver.fallbacks().is_empty());
        assert!(solver.board().open_locs().all(|l| solver.board().tile(l).is_none()));
        // Cells next to the endpoints are already narrowed.
        let (start, _) = solver.endpoints();
        let beside = solver.board().step(start, Direction::East).unwrap();
        assert_eq!(solver.options_at(beside), Some(8));

        let result = solver.clear_and_resolve().unwrap();
        assert!(result.success);
        assert!(solver.board().is_collapsed());
    }

    #[test]
    fn endpoints_must_be_on_the_board() {
        let level = level(&[". ."], (0, 0), (2, 0));
        let catalog = Arc::new(level.catalog().unwrap());
        let res = Solver::new(&level, catalog, rng(0));
        assert!(matches!(res, Err(Error::OutOfBounds { what: "goal", loc: (2, 0), .. })));
    }

    #[test]
    fn start_equal_to_goal_is_reachable() {
        let level = level(&["0000 ."], (0, 0), (0, 0));
        let mut solver = solver(&level, 0);
        assert!(solver.solve().unwrap().reachable);
    }

    #[test]
    fn report_receives_the_verdict() {
        let level = Level::small();
        let mut solver = solver(&level, 4);
        let mut seen = vec![];
        let result = solver.solve_and_report(&mut |r: &SolveResult| seen.push(r.clone())).unwrap();
        assert_eq!(seen, vec![result]);
    }

    #[test]
    fn repeated_choices_respect_placed_neighbours() {
        let level = Level::small();
        let mut solver = solver(&level, 1);
        let open = solver.board().open_locs().count();

        let mut picks = 0;
        while let Some((loc, tile)) = solver.forced_choice().unwrap() {
            assert!(tile.is_some(), "the standard set never dead-ends at {:?}", loc);
            assert_eq!(solver.board().mismatched_edges(solver.catalog()).count(), 0);
            picks += 1;
            assert!(picks <= open);
        }
        assert_eq!(picks, open);
        assert_eq!(solver.status(), Status::Done);
        assert!(solver.evaluate().success);
    }

    #[test]
    fn forced_neighbours_that_disagree_fail() {
        // Each open cell is pinned by its fixed neighbour, but the two pinned
        // tiles do not match each other.
        let level = with_tiles(
            level(&["L . . R"], (0, 0), (3, 0)),
            vec![
                TileSpec::reserved("L", "0x00"),
                TileSpec::reserved("R", "000y"),
                TileSpec::new("P", "0z0x"),
                TileSpec::new("Q", "0y0w"),
                TileSpec::reserved("none", "0000"),
            ],
            "none",
        );
        let mut solver = solver(&level, 0);
        let result = solver.solve().unwrap();

        assert!(solver.board().is_collapsed());
        assert!(result.fallbacks.is_empty());
        assert_eq!(
            solver.board().mismatched_edges(solver.catalog()).collect::<Vec<_>>(),
            vec![((1, 0), Direction::East)],
        );
        assert!(!result.success);
    }
}
