//! # genolap-core
//!
//! Core data structures shared by the genolap crates: genomic regions, region
//! sets read from BED-like files, half-open intervals and chromosome size
//! maps.
//!
//! ```rust,ignore
//! use genolap_core::models::RegionSet;
//! use genolap_core::utils::read_chrom_sizes;
//!
//! let peaks = RegionSet::try_from("peaks.bed.gz")?;
//! let sizes = read_chrom_sizes("hg38.chrom.sizes")?;
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::GenolapCoreError;
pub use utils::ChromSizes;
