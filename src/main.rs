//! errmode - a terminal log viewer that highlights error lines
//!
//! Lines mentioning ERROR, WARNING, SEVERE, `Caused by:` or
//! `nested exception is:` are marked around the visible window, and the
//! viewer can step between them or list them all.

mod buffer;
mod command;
mod config;
mod display;
mod error;
mod highlight;
mod input;
mod patterns;
mod terminal;
mod viewer;
mod window;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use buffer::Buffer;
use config::Config;
use error::Result;
use highlight::collect_all_matches;
use patterns::PatternSet;
use terminal::Terminal;
use viewer::ViewerState;

/// Environment variable holding the log filter
const LOG_ENV: &str = "ERRMODE_LOG";

#[derive(Parser, Debug)]
#[command(name = "errmode", version, about = "View a log file with its error lines highlighted")]
struct Cli {
    /// File to view
    file: PathBuf,

    /// Config file (default: ~/.errmode.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not reload the file when it changes
    #[arg(long)]
    no_follow: bool,

    /// Show line numbers
    #[arg(long)]
    line_numbers: bool,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print every error line as LINE:TEXT and exit
    #[arg(long)]
    list: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.no_follow {
        config.follow = false;
    }
    if cli.line_numbers {
        config.line_numbers = true;
    }
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }

    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }

    let buffer = Buffer::from_file(&cli.file)?;
    info!(file = %cli.file.display(), lines = buffer.line_count(), "opened");

    if cli.list {
        return list_errors(&buffer);
    }

    let mut terminal = Terminal::new()?;
    let mut viewer = ViewerState::new(buffer, &config, terminal.rows());
    viewer.run(&mut terminal)
}

/// Print every error line to stdout
fn list_errors(buffer: &Buffer) -> Result<()> {
    let patterns = PatternSet::builtin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for m in collect_all_matches(buffer, &patterns) {
        writeln!(out, "{}:{}", m.line + 1, m.text)?;
    }
    Ok(())
}

/// Send tracing output to a file; the terminal belongs to the viewer
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
