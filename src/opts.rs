use std::path::PathBuf;

use structopt::StructOpt;
use wavetile::Preset;

/// Fill a grid with edge-matched tiles and check that the start reaches the goal.
#[derive(Debug, StructOpt)]
#[structopt(name = "wavetile")]
pub struct Opts {
    /// Seed for a reproducible board.
    #[structopt(long)]
    pub seed: Option<u64>,
    /// Drive the solve from the keyboard.
    #[structopt(short, long)]
    pub interactive: bool,
    #[structopt(subcommand)]
    pub def: Def,
}

#[derive(Debug, StructOpt)]
pub enum Def {
    /// One of the built-in levels: small, medium or large.
    Preset {
        #[structopt(default_value = "small")]
        preset: Preset,
    },
    /// A level file in JSON.
    Level {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
}
