use std::{convert::TryFrom, fmt, str::FromStr};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{ensure, error::Error};

/// The connector code for an open, traversable socket.
pub const OPEN: char = '1';

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Canonical signature order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Unit step on the grid. North is +y, east is +x.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

/// A single socket code on one tile edge.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct Connector(pub char);

impl Connector {
    pub fn is_open(self) -> bool {
        self.0 == OPEN
    }
}

/// Connector codes for the four edges of a tile.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct Signature([Connector; 4]);

impl Signature {
    pub fn new(connectors: [Connector; 4]) -> Self {
        Self(connectors)
    }

    pub fn edge(&self, dir: Direction) -> Connector {
        self.0[dir.index()]
    }

    pub fn is_open(&self, dir: Direction) -> bool {
        self.edge(dir).is_open()
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars = s.chars().map(Connector).collect::<Vec<_>>();
        <[Connector; 4]>::try_from(chars.as_slice())
            .map(Signature)
            .map_err(|_| Error::MalformedSignature(s.to_owned()))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c.0)?;
        }
        Ok(())
    }
}

/// Index of a tile inside its [`Catalog`].
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone)]
pub struct TileId(usize);

/// How a tile is described in level files and to [`Catalog::new`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileSpec {
    pub name: String,
    pub signature: String,
    /// Whether the solver may pick this tile for an open cell.
    #[serde(default = "TileSpec::default_candidate")]
    pub candidate: bool,
}

impl TileSpec {
    pub fn new(name: &str, signature: &str) -> Self {
        Self {
            name: name.to_owned(),
            signature: signature.to_owned(),
            candidate: true,
        }
    }

    /// A tile that is only ever placed by hand or as the dead-end fallback.
    pub fn reserved(name: &str, signature: &str) -> Self {
        Self {
            candidate: false,
            ..Self::new(name, signature)
        }
    }

    fn default_candidate() -> bool {
        true
    }
}

#[derive(Debug)]
struct Tile {
    signature: Signature,
    candidate: bool,
}

/// Immutable mapping from tile names to signatures.
#[derive(Debug)]
pub struct Catalog {
    tiles: IndexMap<String, Tile>,
    fallback: TileId,
}

// Constructors
impl Catalog {
    pub fn new<I>(specs: I, fallback: &str) -> Result<Self, Error> where I: IntoIterator<Item = TileSpec> {
        let mut tiles = IndexMap::<String, Tile>::new();
        for spec in specs {
            let signature = spec.signature.parse::<Signature>()?;
            ensure!(!tiles.contains_key(&spec.name), Error::DuplicateTile(spec.name));
            tiles.insert(spec.name, Tile { signature, candidate: spec.candidate });
        }
        let fallback = tiles.get_full(fallback)
            .map(|(i, _, _)| TileId(i))
            .ok_or_else(|| Error::UnknownTile(fallback.to_owned()))?;
        Ok(Self { tiles, fallback })
    }

    /// All sixteen open/closed pipe pieces, each named after its signature,
    /// with the fully closed piece as fallback.
    pub fn standard() -> Self {
        Self::new(Self::standard_specs(), "0000")
            .expect("the standard pipe set to be well formed.")
    }

    pub fn standard_specs() -> impl Iterator<Item = TileSpec> {
        (0..16u8).map(|bits| {
            let sig = (0..4)
                .map(|i| if bits & (0b1000 >> i) != 0 { OPEN } else { '0' })
                .collect::<String>();
            TileSpec::new(&sig, &sig)
        })
    }
}

// Lookups
impl Catalog {
    pub fn signature(&self, id: TileId) -> &Signature {
        &self.tiles[id.0].signature
    }

    pub fn name(&self, id: TileId) -> &str {
        let (name, _) = self.tiles.get_index(id.0).expect("tile id to belong to this catalog.");
        name
    }

    pub fn lookup(&self, name: &str) -> Option<TileId> {
        self.tiles.get_full(name).map(|(i, _, _)| TileId(i))
    }

    pub fn fallback(&self) -> TileId {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len()).map(TileId)
    }

    /// Tiles that seed every open cell's option set.
    pub fn candidates(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.values()
            .enumerate()
            .filter(|(_, tile)| tile.candidate)
            .map(|(i, _)| TileId(i))
    }
}
