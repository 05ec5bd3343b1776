//! Genome-wide interval indexing.
//!
//! [`MultiChromOverlapper`] keeps one [`AIList`] per chromosome so a whole
//! [`RegionSet`] can be queried against another one.
//!
//! ```
//! use genolap_core::models::{Region, RegionSet};
//! use genolap_overlaprs::IntoMultiChromOverlapper;
//!
//! let genes = RegionSet::from(vec![
//!     Region::new("chr1", 1000, 2000),
//!     Region::new("chr2", 1000, 3000),
//! ]);
//! let index = genes.into_multi_chrom_overlapper();
//!
//! let peaks = RegionSet::from(vec![Region::new("chr2", 2000, 4000)]);
//! assert_eq!(index.find_overlaps_iter(&peaks).count(), 1);
//! ```
use std::collections::HashMap;

use genolap_core::models::{Interval, Region, RegionSet};

use crate::{AIList, Overlapper};

/// One [`AIList`] per chromosome.
#[derive(Debug, Clone, Default)]
pub struct MultiChromOverlapper {
    index_maps: HashMap<String, AIList<u32, ()>>,
}

impl MultiChromOverlapper {
    /// Index of one chromosome, if any interval lies on it.
    pub fn chrom_index(&self, chr: &str) -> Option<&AIList<u32, ()>> {
        self.index_maps.get(chr)
    }

    /// Every (query region, indexed interval) pair that overlaps.
    ///
    /// Query regions on chromosomes absent from the index yield nothing.
    pub fn find_overlaps_iter<'a, 'b>(
        &'a self,
        rs: &'b RegionSet,
    ) -> impl Iterator<Item = (&'b Region, &'a Interval<u32, ()>)> + use<'a, 'b> {
        rs.regions.iter().flat_map(move |region| {
            self.index_maps
                .get(&region.chr)
                .into_iter()
                .flat_map(move |lapper| lapper.find_iter(region.start, region.end))
                .map(move |hit| (region, hit))
        })
    }

    pub fn chrom_count(&self) -> usize {
        self.index_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_maps.is_empty()
    }
}

/// Build a [`MultiChromOverlapper`] from a collection of regions.
pub trait IntoMultiChromOverlapper {
    fn into_multi_chrom_overlapper(self) -> MultiChromOverlapper;
}

impl IntoMultiChromOverlapper for &RegionSet {
    fn into_multi_chrom_overlapper(self) -> MultiChromOverlapper {
        let index_maps = self
            .intervals_by_chrom()
            .into_iter()
            .map(|(chr, intervals)| (chr.to_string(), AIList::build(intervals)))
            .collect();

        MultiChromOverlapper { index_maps }
    }
}

impl IntoMultiChromOverlapper for RegionSet {
    fn into_multi_chrom_overlapper(self) -> MultiChromOverlapper {
        (&self).into_multi_chrom_overlapper()
    }
}
