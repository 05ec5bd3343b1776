use clap::{Arg, ArgAction, Command, arg, value_parser};
use std::path::PathBuf;

pub const OLOGRAM_CMD: &str = "ologram";

pub fn create_ologram_cli() -> Command {
    Command::new(OLOGRAM_CMD)
        .about("Test the overlaps of a query region set with reference sets against shuffled sets.")
        .arg_required_else_help(true)
        .arg(
            arg!(-q --query <BED>)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Query BED file (plain or gzipped)"),
        )
        .arg(
            arg!(-r --refs <BED>)
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf))
                .help("Reference BED files"),
        )
        .arg(
            arg!(-l --labels <LABEL>)
                .required(false)
                .num_args(1..)
                .help("One label per reference file (letters, digits and '_'). Defaults to the file names"),
        )
        .arg(
            Arg::new("chrom-sizes")
                .short('c')
                .long("chrom-sizes")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a chrom.sizes file (chromosome<TAB>length)"),
        )
        .arg(
            Arg::new("bed-excl")
                .long("bed-excl")
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("Regions removed from the genome before shuffling"),
        )
        .arg(
            Arg::new("bed-incl")
                .long("bed-incl")
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("Restrict the genome to these regions before shuffling"),
        )
        .arg(
            Arg::new("force-chrom")
                .long("force-chrom")
                .action(ArgAction::SetTrue)
                .help("Drop regions on chromosomes missing from the chrom sizes instead of failing"),
        )
        .arg(
            arg!(--config <TOML>)
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("Run configuration file, overridden by the flags below"),
        )
        .arg(
            Arg::new("minibatch-count")
                .short('n')
                .long("minibatch-count")
                .value_parser(value_parser!(usize))
                .help("Number of minibatches"),
        )
        .arg(
            Arg::new("minibatch-size")
                .short('s')
                .long("minibatch-size")
                .value_parser(value_parser!(usize))
                .help("Number of shuffles per minibatch"),
        )
        .arg(
            arg!(-t --threads <N>)
                .value_parser(value_parser!(usize))
                .help("Number of worker threads, 0 for all cores"),
        )
        .arg(
            arg!(--seed <SEED>)
                .value_parser(value_parser!(u64))
                .help("Seed of the random streams"),
        )
        .arg(
            Arg::new("use-markov")
                .long("use-markov")
                .action(ArgAction::SetTrue)
                .help("Shuffle with an order-2 Markov model of lengths and gaps (beta)"),
        )
        .arg(
            Arg::new("multiple-overlap")
                .short('m')
                .long("multiple-overlap")
                .action(ArgAction::SetTrue)
                .help("Test combinations of reference sets overlapping the query together"),
        )
        .arg(
            Arg::new("target-combi-size")
                .long("target-combi-size")
                .value_parser(value_parser!(usize))
                .help("Size of the reported combinations, the query included. The query plus every reference counts combinations exactly"),
        )
        .arg(
            Arg::new("max-combis")
                .long("max-combis")
                .value_parser(value_parser!(usize))
                .help("Keep at most this many combinations, selected with MODL"),
        )
        .arg(
            Arg::new("modl-min-ratio")
                .long("modl-min-ratio")
                .value_parser(value_parser!(f64))
                .help("Smallest abundance ratio considered by MODL"),
        )
        .arg(
            Arg::new("custom-combis")
                .long("custom-combis")
                .value_parser(value_parser!(PathBuf))
                .help("File of 0/1 rows [query ref_1 ... ref_k] listing the combinations to test"),
        )
        .arg(
            Arg::new("sort-features")
                .long("sort-features")
                .help("Sort the output by this statistic column"),
        )
        .arg(
            arg!(-o --output <TSV>)
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("Output TSV path (default: stdout)"),
        )
        .arg(
            arg!(--json <JSON>)
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("Also write the records as JSON"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .action(ArgAction::SetTrue)
                .help("Hide the progress bars"),
        )
}
