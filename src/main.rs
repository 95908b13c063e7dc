use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use snafu::ErrorCompat;

mod args;
mod decision;

fn main() {
    let args = args::Args::parse();

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    info!("args: {:?}", args);

    if let Err(e) = decision::run_decision(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("caused by: {}", cause);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
