mod ologram;

use anyhow::Result;
use clap::{ArgAction, Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "genolap";
    pub const BIN_NAME: &str = "genolap";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Monte-Carlo statistics of the overlaps between genomic region sets.")
        .subcommand_required(true)
        .arg(
            arg!(-v --verbose "Increase logging verbosity (-v info, -vv debug)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(ologram::cli::create_ologram_cli())
}

fn init_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logging(matches.get_count("verbose"));

    match matches.subcommand() {
        //
        // OLOGRAM
        //
        Some((ologram::cli::OLOGRAM_CMD, matches)) => {
            ologram::handlers::run_ologram(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
