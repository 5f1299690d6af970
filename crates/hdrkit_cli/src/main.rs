mod cli;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{Cli, run, summary_line};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = hdrkit_log::init_logging(cli.verbose, cli.quiet) {
        eprintln!("warning: logging disabled ({e})");
    }

    match run(&cli) {
        Ok(report) => {
            if let Some(c_line) = summary_line(&cli, &report) {
                println!("{c_line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
