//! # Monte-Carlo overlap statistics between genomic region sets
//!
//! `genolap-stats` asks whether a query region set overlaps reference sets
//! more (or less) than expected by chance. Both sets are shuffled many times
//! over the genome, the overlap of every shuffle is measured, a Negative
//! Binomial is fitted to the shuffled values and the true overlap is scored
//! against it.
//!
//! Two statistics are reported per reference set or combination of sets:
//! the number of intersections (N) and the summed overlap length in base
//! pairs (S).
//!
//! ```rust,no_run
//! use genolap_core::models::RegionSet;
//! use genolap_core::utils::read_chrom_sizes;
//! use genolap_stats::analysis::{LabeledSet, run_pairwise};
//! use genolap_stats::config::RunConfig;
//! use genolap_stats::genome::Genome;
//!
//! let genome = Genome::new(read_chrom_sizes("hg38.chrom.sizes").unwrap());
//! let query = RegionSet::try_from("peaks.bed").unwrap();
//! let genes = LabeledSet::new("genes", RegionSet::try_from("genes.bed").unwrap());
//!
//! let records = run_pairwise(&query, &[genes], &genome, &RunConfig::default()).unwrap();
//! println!("{}", records[0].nb_intersections.pvalue);
//! ```
pub mod accumulator;
pub mod analysis;
pub mod combinations;
pub mod config;
pub mod errors;
pub mod genome;
pub mod interval_ranges;
pub mod markov;
pub mod modl;
pub mod negbin;
pub mod output;
pub mod records;
pub mod scheduler;
pub mod shuffle;

pub use analysis::{LabeledSet, run_multiple, run_pairwise};
pub use config::{MultipleOverlapConfig, RunConfig};
pub use errors::GenolapStatsError;
pub use genome::Genome;
pub use records::{OverlapStatRecord, StatColumn, sort_records};
