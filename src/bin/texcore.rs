use anyhow::{Context, Result};
use clap::Parser;
use simple_logger::SimpleLogger;

use texcore::cli::{Cli, read_input};
use texcore::engine;

fn main() {
    let args = Cli::parse();

    SimpleLogger::new().with_level(args.level_filter()).with_colors(true).with_timestamps(false).init().unwrap();

    if let Err(e) = run(&args) {
        if args.python_traceback {
            eprintln!("Traceback (most recent call last):\n{e:?}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1)
    }
}

fn run(args: &Cli) -> Result<()> {
    let text = read_input(args).with_context(|| format!("reading {}", args.file))?;
    let filename = if args.file == "-" { None } else { Some(args.file.as_str()) };

    let (state, result) = engine::run(&text, filename);
    result.map_err(|err| anyhow::anyhow!(engine::format_error(&err, &state, &text)))
}
