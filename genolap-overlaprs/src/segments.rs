//! Elementary overlap segments between a query set and several references.
//!
//! Every breakpoint of the query and reference intervals on a chromosome
//! cuts it into elementary segments. A segment is described by a membership
//! mask: bit 0 is the query, bit `i` the `i`-th reference set. Only
//! segments where the query meets at least one reference are kept, and
//! contiguous segments sharing the same mask are merged.
use std::collections::BTreeMap;

use genolap_core::models::{Interval, RegionSet};

use crate::OverlapCounts;
use crate::errors::OverlapError;

/// Bit 0 holds the query, leaving 63 bits for references.
pub const MAX_REFERENCE_SETS: usize = 63;

/// Query bit of a membership mask.
pub const QUERY_BIT: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
    pub mask: u64,
}

impl Segment {
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

fn chrom_segments(sets: &[&[Interval<u32, ()>]], out: &mut Vec<Segment>) {
    // (position, set, opening)
    let mut events: Vec<(u32, usize, bool)> = sets
        .iter()
        .enumerate()
        .flat_map(|(set, intervals)| {
            intervals
                .iter()
                .flat_map(move |iv| [(iv.start, set, true), (iv.end, set, false)])
        })
        .collect();
    events.sort_unstable();

    let mut depth = vec![0u32; sets.len()];
    let mut mask = 0u64;
    let mut idx = 0;
    let chrom_start = out.len();

    while idx < events.len() {
        let pos = events[idx].0;
        while idx < events.len() && events[idx].0 == pos {
            let (_, set, opening) = events[idx];
            if opening {
                depth[set] += 1;
                mask |= 1 << set;
            } else {
                depth[set] -= 1;
                if depth[set] == 0 {
                    mask &= !(1 << set);
                }
            }
            idx += 1;
        }

        let Some(&(next, _, _)) = events.get(idx) else {
            break;
        };
        if mask & QUERY_BIT == 0 || mask == QUERY_BIT {
            continue;
        }

        let in_chrom = out.len() > chrom_start;
        match out.last_mut() {
            Some(last) if in_chrom && last.end == pos && last.mask == mask => {
                last.end = next;
            }
            _ => out.push(Segment {
                start: pos,
                end: next,
                mask,
            }),
        }
    }
}

///
/// Elementary segments where the query overlaps at least one of `refs`.
///
/// Segments are returned chromosome by chromosome (name order), sorted by
/// start within a chromosome.
///
pub fn overlap_segments(
    query: &RegionSet,
    refs: &[&RegionSet],
) -> Result<Vec<Segment>, OverlapError> {
    if refs.len() > MAX_REFERENCE_SETS {
        return Err(OverlapError::TooManyReferenceSets {
            got: refs.len(),
            max: MAX_REFERENCE_SETS,
        });
    }

    let query_by_chrom = query.intervals_by_chrom();
    let refs_by_chrom: Vec<BTreeMap<&str, Vec<Interval<u32, ()>>>> =
        refs.iter().map(|rs| rs.intervals_by_chrom()).collect();

    let mut segments = Vec::new();
    for (chr, query_intervals) in &query_by_chrom {
        let mut sets: Vec<&[Interval<u32, ()>]> = vec![query_intervals.as_slice()];
        sets.extend(
            refs_by_chrom
                .iter()
                .map(|grouped| grouped.get(chr).map_or(&[][..], |v| v.as_slice())),
        );
        chrom_segments(&sets, &mut segments);
    }

    Ok(segments)
}

/// Does a segment mask count toward `key`?
#[inline]
pub fn mask_matches(mask: u64, key: u64, exact: bool) -> bool {
    match exact {
        true => mask == key,
        false => mask & key == key,
    }
}

///
/// N (number of matching segments) and S (summed segment length) for each
/// key, in the order of `keys`.
///
/// Exact counting keeps segments whose mask equals the key, inexact
/// counting keeps every segment whose mask contains the key.
///
pub fn count_combinations(segments: &[Segment], keys: &[u64], exact: bool) -> Vec<OverlapCounts> {
    keys.iter()
        .map(|&key| {
            let mut counts = OverlapCounts::default();
            for segment in segments.iter().filter(|s| mask_matches(s.mask, key, exact)) {
                counts.n += 1;
                counts.s += segment.width() as u64;
            }
            counts
        })
        .collect()
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

    fn seg(start: u32, end: u32, mask: u64) -> Segment {
        Segment { start, end, mask }
    }

    #[fixture]
    fn sets() -> (RegionSet, RegionSet, RegionSet) {
        let query = make_regionset(vec![("chr1", 0, 100), ("chr2", 0, 10)]);
        let a = make_regionset(vec![("chr1", 10, 60), ("chr2", 5, 20)]);
        let b = make_regionset(vec![("chr1", 40, 80), ("chr1", 150, 200)]);
        (query, a, b)
    }

    #[rstest]
    fn test_segments(sets: (RegionSet, RegionSet, RegionSet)) {
        let (query, a, b) = sets;
        let segments = overlap_segments(&query, &[&a, &b]).unwrap();

        assert_eq!(
            segments,
            vec![
                seg(10, 40, 0b011),
                seg(40, 60, 0b111),
                seg(60, 80, 0b101),
                seg(5, 10, 0b011),
            ]
        );
    }

    #[rstest]
    fn test_reference_only_overlaps_are_ignored() {
        let query = make_regionset(vec![("chr1", 0, 10)]);
        let a = make_regionset(vec![("chr1", 50, 100)]);
        let b = make_regionset(vec![("chr1", 60, 90)]);

        assert!(overlap_segments(&query, &[&a, &b]).unwrap().is_empty());
    }

    #[rstest]
    fn test_contiguous_segments_are_merged() {
        // the query split in two bookended regions still yields one segment
        let query = make_regionset(vec![("chr1", 0, 50), ("chr1", 50, 100)]);
        let a = make_regionset(vec![("chr1", 20, 80)]);

        let segments = overlap_segments(&query, &[&a]).unwrap();
        assert_eq!(segments, vec![seg(20, 80, 0b11)]);
    }

    #[rstest]
    fn test_segments_are_not_merged_across_chromosomes() {
        // chr1 ends where chr2 starts, with the same mask
        let query = make_regionset(vec![("chr1", 0, 50), ("chr2", 50, 90)]);
        let a = make_regionset(vec![("chr1", 20, 50), ("chr2", 50, 70)]);

        let segments = overlap_segments(&query, &[&a]).unwrap();
        assert_eq!(segments, vec![seg(20, 50, 0b11), seg(50, 70, 0b11)]);
    }

    #[rstest]
    fn test_exact_and_inexact_counting(sets: (RegionSet, RegionSet, RegionSet)) {
        let (query, a, b) = sets;
        let segments = overlap_segments(&query, &[&a, &b]).unwrap();
        let keys = [0b011, 0b111];

        let exact = count_combinations(&segments, &keys, true);
        assert_eq!(exact, vec![OverlapCounts::new(2, 35), OverlapCounts::new(1, 20)]);

        let inexact = count_combinations(&segments, &keys, false);
        assert_eq!(inexact, vec![OverlapCounts::new(3, 55), OverlapCounts::new(1, 20)]);
    }

    #[rstest]
    fn test_too_many_sets() {
        let query = make_regionset(vec![("chr1", 0, 10)]);
        let refs: Vec<&RegionSet> = std::iter::repeat_n(&query, 64).collect();
        assert_eq!(
            overlap_segments(&query, &refs),
            Err(OverlapError::TooManyReferenceSets { got: 64, max: 63 })
        );
    }
}
