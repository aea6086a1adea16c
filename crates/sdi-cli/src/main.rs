use sdi_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible.
    logging::init();

    // Parse CLI and run the install.
    if let Err(err) = Cli::run_from_args() {
        eprintln!("sdi error: {:#}", err);
        std::process::exit(1);
    }
}
