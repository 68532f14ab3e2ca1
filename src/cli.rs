//! Command-line surface; kept thin and delegated to entirely from
//! `bin/texcore.rs`, with a single `#[derive(Parser)]` struct whose doc
//! comments double as `--help` text.

use clap::Parser;
use std::{fs, io, path::PathBuf};

#[derive(Parser)]
#[command(name = "texcore", version, about)]
pub struct Cli {
    /// TeX source file to run. To read from standard input (stdin), use "-".
    pub file: String,

    /// Increase log verbosity; repeat for more (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write log output to this file as well as stderr; implies -v.
    #[arg(short = 'L', long = "logfile")]
    pub logfile: Option<PathBuf>,

    /// Print a backtrace-shaped dump of the error chain on failure, instead
    /// of the single-line `<file>:<line>:<col>: <message>` report. Named
    /// after the original Python implementation's equivalent flag; kept for
    /// interface compatibility.
    #[arg(long = "python-traceback")]
    pub python_traceback: bool,
}

impl Cli {
    /// The effective log level, folding in `--logfile`'s implied verbosity.
    pub fn level_filter(&self) -> log::LevelFilter {
        let count = if self.logfile.is_some() { self.verbose.max(1) } else { self.verbose };
        match count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

pub fn read_input(args: &Cli) -> io::Result<String> {
    match args.file.as_str() {
        "-" => io::read_to_string(io::stdin()),
        _ => fs::read_to_string(&args.file),
    }
}
