//! `bookpress` binary. Exit codes: 0 success, 1 invalid input or config,
//! 2 crawler or network failure, 3 output, render or filesystem failure.

use clap::Parser;
use bookpress::cli::{run, Args};

fn main() {
    let args = Args::parse();
    let Err(err) = run(&args) else {
        return;
    };
    for line in err.report(args.verbose) {
        eprintln!("{line}");
    }
    std::process::exit(err.exit_code());
}
