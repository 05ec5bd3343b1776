//! Interval overlap machinery for genolap.
//!
//! This crate owns every overlap computation of the workspace: the
//! [`AIList`] index, the per-chromosome [`MultiChromOverlapper`], the
//! pairwise intersection statistics (N and S) and the multi-set segment
//! sweep used by the combinatorial analysis. Higher level crates wrap these
//! functions but should not reimplement overlap algorithms.
//!
//! ```rust
//! use genolap_core::models::{Region, RegionSet};
//! use genolap_overlaprs::compute_overlap;
//!
//! let peaks = RegionSet::from(vec![Region::new("chr1", 100, 200)]);
//! let genes = RegionSet::from(vec![Region::new("chr1", 150, 400)]);
//!
//! let counts = compute_overlap(&peaks, &genes);
//! assert_eq!((counts.n, counts.s), (1, 50));
//! ```

/// Augmented Interval List implementation.
///
/// See [`AIList`] for details.
pub mod ailist;

/// Genome-wide interval indexing.
pub mod multi_chrom_overlapper;

/// Intersection count and summed overlap length between two sets.
pub mod overlap_stats;

/// Elementary segments of a query set against several references.
pub mod segments;

/// Core traits for overlap operations.
pub mod traits;

pub mod errors;

// re-exports
pub use self::ailist::AIList;
pub use self::errors::OverlapError;
pub use self::multi_chrom_overlapper::{IntoMultiChromOverlapper, MultiChromOverlapper};
pub use self::overlap_stats::{OverlapCounts, compute_overlap};
pub use self::segments::{MAX_REFERENCE_SETS, Segment, count_combinations, overlap_segments};
pub use self::traits::{Interval, Overlapper};
