use std::{io::{self, stdin, stdout, Write}, process, sync::Arc};

use rand::SeedableRng;
use structopt::StructOpt;
use termion::{color, event::Key, input::TermRead, raw::IntoRawMode, style};
use tracing_subscriber::EnvFilter;

use wavetile::{BaseRng, Direction, Error, Level, Loc, Signature, SolveResult, Solver, Step};

mod opts;
use opts::{Def, Opts};

const HELP: &str = "p: propagate  c: collapse step  f: fill  r: clear and refill  q: quit";

// Indexed by open sides: north = 1, east = 2, south = 4, west = 8.
const GLYPHS: [char; 16] = [
    '·', '╵', '╶', '└', '╷', '│', '┌', '├',
    '╴', '┘', '─', '┴', '┐', '┤', '┬', '┼',
];

fn glyph(sig: &Signature) -> char {
    let mask = Direction::ALL.iter()
        .enumerate()
        .filter(|&(_, dir)| sig.is_open(*dir))
        .fold(0, |mask, (i, _)| mask | (1 << i));
    GLYPHS[mask]
}

fn cell_char(solver: &Solver, loc: Loc) -> char {
    match solver.board().tile(loc) {
        Some(tile) => glyph(solver.catalog().signature(tile)),
        None => match solver.options_at(loc) {
            Some(0) => '!',
            Some(n) if n < 10 => (b'0' + n as u8) as char,
            _ => '?',
        },
    }
}

fn print_board<W: Write>(output: &mut W, solver: &Solver, line_end: &str) -> io::Result<()> {
    let board = solver.board();
    let (start, goal) = solver.endpoints();
    let snippet = board.display(|loc, _| cell_char(solver, loc));
    for (row, chars) in snippet.iter().enumerate() {
        let y = board.h() - 1 - row;
        for (x, &c) in chars.iter().enumerate() {
            let loc = (x, y);
            if loc == start || loc == goal {
                write!(output, "{}{}{}", color::Fg(color::Yellow), c, color::Fg(color::Reset))?;
            } else if solver.fallbacks().contains(&loc) {
                write!(output, "{}{}{}", color::Fg(color::Red), c, color::Fg(color::Reset))?;
            } else if board.cell(loc).fixed {
                write!(output, "{}{}{}", color::Fg(color::Cyan), c, color::Fg(color::Reset))?;
            } else {
                write!(output, "{}", c)?;
            }
        }
        write!(output, "{}", line_end)?;
    }
    output.flush()
}

fn verdict(result: &SolveResult) -> String {
    let mut text = if result.reachable {
        "Path found! The start reaches the goal.".to_owned()
    } else {
        "No path. The start is cut off from the goal.".to_owned()
    };
    if result.is_degraded() {
        text.push_str(&format!(" ({} cells had no matching tile.)", result.fallbacks.len()));
    }
    text
}

fn describe(solver: &Solver, step: &Step) -> String {
    match step {
        Step::Forced(n) => format!("committed {} forced cells", n),
        Step::Chose { loc, tile } => format!("chose {} at {:?}", solver.catalog().name(*tile), loc),
        Step::Fallback { loc } => format!("nothing fits at {:?}, placed fallback", loc),
        Step::Done => verdict(&solver.evaluate()),
    }
}

fn redraw<W: Write>(output: &mut W, solver: &Solver, message: &str) -> io::Result<()> {
    write!(output, "{}{}", termion::clear::All, termion::cursor::Goto(1, 1))?;
    print_board(output, solver, "\n\r")?;
    write!(output, "\n\r{}{}{}\n\r{}\n\r", style::Bold, message, style::Reset, HELP)?;
    output.flush()
}

fn interactive(solver: &mut Solver) -> Result<(), Error> {
    let mut stdout = stdout().into_raw_mode()?;
    redraw(&mut stdout, solver, "Welcome.")?;

    for key in stdin().keys() {
        let message = match key? {
            Key::Char('q') | Key::Esc | Key::Ctrl('c') => break,
            Key::Char('p') => {
                solver.propagate();
                "propagated".to_owned()
            },
            Key::Char('c') => {
                let step = solver.collapse_step()?;
                describe(solver, &step)
            },
            Key::Char('f') => verdict(&solver.solve()?),
            Key::Char('r') => verdict(&solver.clear_and_resolve()?),
            _ => continue,
        };
        redraw(&mut stdout, solver, &message)?;
    }

    write!(stdout, "\n\rThanks for playing! Farewell.\n\r")?;
    Ok(())
}

fn run(cfg: Opts) -> Result<(), Error> {
    let level = match &cfg.def {
        Def::Preset { preset } => Level::preset(*preset),
        Def::Level { path } => Level::load(path)?,
    };
    let catalog = Arc::new(level.catalog()?);
    let mut solver = match cfg.seed {
        Some(seed) => Solver::new(&level, catalog, BaseRng::seed_from_u64(seed))?,
        None => Solver::from_entropy(&level, catalog)?,
    };

    if cfg.interactive {
        return interactive(&mut solver);
    }

    let result = solver.solve()?;
    let mut out = stdout();
    print_board(&mut out, &solver, "\n")?;
    writeln!(out, "{}", verdict(&result))?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run(Opts::from_args()) {
        eprintln!("wavetile: {}", e);
        process::exit(1);
    }
}
