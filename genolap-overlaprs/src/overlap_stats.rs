use std::ops::AddAssign;

use genolap_core::models::RegionSet;

use crate::{IntoMultiChromOverlapper, MultiChromOverlapper};

/// Intersections between two region sets.
///
/// `n` counts the overlapping (query, reference) pairs, `s` sums the number
/// of base pairs shared by each of those pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapCounts {
    pub n: u64,
    pub s: u64,
}

impl OverlapCounts {
    pub fn new(n: u64, s: u64) -> Self {
        OverlapCounts { n, s }
    }
}

impl AddAssign for OverlapCounts {
    fn add_assign(&mut self, other: Self) {
        self.n += other.n;
        self.s += other.s;
    }
}

/// Count intersections of `query` against an already built reference index.
pub fn overlap_with_index(query: &RegionSet, index: &MultiChromOverlapper) -> OverlapCounts {
    let mut counts = OverlapCounts::default();
    for (region, hit) in index.find_overlaps_iter(query) {
        counts.n += 1;
        counts.s += region.as_interval().intersect(hit) as u64;
    }
    counts
}

///
/// Number of intersecting pairs and summed overlap length between `query`
/// and `reference`.
///
/// Both sets are expected to be merged beforehand. Chromosomes present in
/// only one of the sets contribute nothing.
///
pub fn compute_overlap(query: &RegionSet, reference: &RegionSet) -> OverlapCounts {
    let index = reference.into_multi_chrom_overlapper();
    overlap_with_index(query, &index)
}

#[cfg(test)]
mod tests {
    use super::*;

    use genolap_core::models::Region;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn make_regionset(regions: Vec<(&str, u32, u32)>) -> RegionSet {
        RegionSet::from(
            regions
                .into_iter()
                .map(|(chr, start, end)| Region::new(chr, start, end))
                .collect::<Vec<_>>(),
        )
    }

    #[rstest]
    fn test_pairs_and_bases() {
        let query = make_regionset(vec![("chr1", 100, 200), ("chr1", 300, 400)]);
        let reference = make_regionset(vec![
            ("chr1", 150, 250),
            ("chr1", 190, 310),
            ("chr2", 100, 200),
        ]);

        // 100-200 hits both references (50 + 10), 300-400 hits the second (10)
        assert_eq!(compute_overlap(&query, &reference), OverlapCounts::new(3, 70));
    }

    #[rstest]
    fn test_query_against_itself() {
        let query = make_regionset(vec![("chr1", 0, 10), ("chr1", 20, 35), ("chr2", 5, 7)]);
        let counts = compute_overlap(&query, &query);

        assert_eq!(counts.n, query.len() as u64);
        assert_eq!(counts.s, query.nucleotides_length());
    }

    #[rstest]
    fn test_bookended_regions_do_not_overlap() {
        let query = make_regionset(vec![("chr1", 0, 10)]);
        let reference = make_regionset(vec![("chr1", 10, 20)]);
        assert_eq!(compute_overlap(&query, &reference), OverlapCounts::default());
    }

    #[rstest]
    fn test_disjoint_chromosomes() {
        let query = make_regionset(vec![("chr1", 0, 10)]);
        let reference = make_regionset(vec![("chrX", 0, 10)]);
        assert_eq!(compute_overlap(&query, &reference), OverlapCounts::default());
    }
}
