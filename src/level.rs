use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;

use crate::{
    board::Loc,
    catalog::{Catalog, TileSpec},
    error::Error,
};

/// Name of the fallback tile when a level does not pick one.
pub const DEFAULT_FALLBACK: &str = "0000";

/// A level as read from disk.
///
/// ```json
/// {
///     "layout": ["0100 . . 0001"],
///     "start": [0, 0],
///     "goal": [3, 0]
/// }
/// ```
///
/// `layout` lists rows north first. `tiles` defaults to the standard pipe set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub tiles: Option<Vec<TileSpec>>,
    #[serde(default)]
    pub fallback: Option<String>,
    pub layout: Vec<String>,
    pub start: Loc,
    pub goal: Loc,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Preset {
    Small,
    Medium,
    Large,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Preset::Small),
            "medium" => Ok(Preset::Medium),
            "large" => Ok(Preset::Large),
            _ => Err(format!("unknown preset `{}`, expected small, medium or large", s)),
        }
    }
}

// Loading.
impl Level {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn small() -> Self {
        Self::preset(Preset::Small)
    }

    pub fn medium() -> Self {
        Self::preset(Preset::Medium)
    }

    pub fn large() -> Self {
        Self::preset(Preset::Large)
    }

    /// An open field with a source on the west edge and a sink on the east
    /// edge, half way up.
    pub fn preset(preset: Preset) -> Self {
        let (w, h) = match preset {
            Preset::Small => (5, 5),
            Preset::Medium => (8, 8),
            Preset::Large => (12, 10),
        };
        let mid = h / 2;
        let layout = (0..h)
            .rev()
            .map(|y| {
                (0..w)
                    .map(|x| match (x, y) {
                        (0, y) if y == mid => "0100",
                        (x, y) if x == w - 1 && y == mid => "0001",
                        _ => ".",
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        Self {
            tiles: None,
            fallback: None,
            layout,
            start: (0, mid),
            goal: (w - 1, mid),
        }
    }
}

impl Level {
    /// Builds the tile catalog this level asks for.
    pub fn catalog(&self) -> Result<Catalog, Error> {
        let fallback = self.fallback.as_deref().unwrap_or(DEFAULT_FALLBACK);
        match &self.tiles {
            Some(tiles) => Catalog::new(tiles.iter().cloned(), fallback),
            None if fallback == DEFAULT_FALLBACK => Ok(Catalog::standard()),
            None => Catalog::new(Catalog::standard_specs(), fallback),
        }
    }
}
