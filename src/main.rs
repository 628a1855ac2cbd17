mod args;
mod sim;

use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
    info!("args {:?}", args);

    if let Err(e) = sim::run_election(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
