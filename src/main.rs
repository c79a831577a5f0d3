use clap::Parser;
use std::process;

use parselab::cli::{self, Cli};

fn main() {
    let args = Cli::parse();
    let _ = simple_logger::init_with_level(args.verbosity.into());

    match cli::run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    }
}
