use genolap_core::ChromSizes;
use genolap_core::models::{Region, RegionSet};

/// Interval algebra on region sets. Every operation returns a new, sorted
/// [RegionSet] without the extra BED columns.
pub trait IntervalRanges {
    /// Clip regions to their chromosome bounds.
    ///
    /// Regions on chromosomes missing from `chrom_sizes`, or left empty
    /// after clipping, are dropped.
    fn trim(&self, chrom_sizes: &ChromSizes) -> RegionSet;

    /// Merge overlapping and bookended regions.
    ///
    /// # Example
    /// ```text
    /// chr1 0–10, chr1 10–20, chr1 15–30, chr1 40–50
    /// reduce: chr1 0–30, chr1 40–50
    /// ```
    fn reduce(&self) -> RegionSet;

    /// Remove from `self` every position covered by `other`.
    ///
    /// # Example
    /// ```text
    /// A: chr1 100–200
    /// B: chr1 120–140, chr1 160–180
    /// setdiff(A, B): chr1 100–120, chr1 140–160, chr1 180–200
    /// ```
    fn setdiff(&self, other: &RegionSet) -> RegionSet;

    /// Positions of the genome not covered by `self`, chromosome by
    /// chromosome. Chromosomes without any region are returned whole.
    fn gaps(&self, chrom_sizes: &ChromSizes) -> RegionSet;
}

impl IntervalRanges for RegionSet {
    fn trim(&self, chrom_sizes: &ChromSizes) -> RegionSet {
        let regions: Vec<Region> = self
            .regions
            .iter()
            .filter_map(|r| {
                let size = *chrom_sizes.get(&r.chr)?;
                let end = r.end.min(size);
                (r.start < end).then(|| Region::new(&r.chr, r.start, end))
            })
            .collect();

        let mut trimmed = RegionSet::from(regions);
        trimmed.sort();
        trimmed
    }

    fn reduce(&self) -> RegionSet {
        let mut merged: Vec<Region> = Vec::with_capacity(self.regions.len());

        for (chr, intervals) in self.intervals_by_chrom() {
            let mut current: Option<(u32, u32)> = None;
            for iv in intervals {
                current = match current {
                    Some((start, end)) if iv.start <= end => Some((start, end.max(iv.end))),
                    Some((start, end)) => {
                        merged.push(Region::new(chr, start, end));
                        Some((iv.start, iv.end))
                    }
                    None => Some((iv.start, iv.end)),
                };
            }
            if let Some((start, end)) = current {
                merged.push(Region::new(chr, start, end));
            }
        }

        RegionSet::from(merged)
    }

    fn setdiff(&self, other: &RegionSet) -> RegionSet {
        let a = self.reduce();
        let b = other.reduce();
        let b_by_chr = b.intervals_by_chrom();

        let mut result: Vec<Region> = Vec::new();

        for (chr, a_chr) in a.intervals_by_chrom() {
            let b_chr = b_by_chr.get(chr).map_or(&[][..], |v| v.as_slice());
            let mut b_idx = 0;

            for a_iv in a_chr {
                // skip subtraction intervals ending before this one starts
                while b_idx < b_chr.len() && b_chr[b_idx].end <= a_iv.start {
                    b_idx += 1;
                }

                let mut pos = a_iv.start;
                for b_iv in b_chr[b_idx..].iter().take_while(|b| b.start < a_iv.end) {
                    if b_iv.start > pos {
                        result.push(Region::new(chr, pos, b_iv.start));
                    }
                    pos = pos.max(b_iv.end);
                }

                if pos < a_iv.end {
                    result.push(Region::new(chr, pos, a_iv.end));
                }
            }
        }

        RegionSet::from(result)
    }

    fn gaps(&self, chrom_sizes: &ChromSizes) -> RegionSet {
        let covered = self.trim(chrom_sizes).reduce();
        let covered_by_chr = covered.intervals_by_chrom();

        let mut result: Vec<Region> = Vec::new();
        for (chr, &size) in chrom_sizes {
            let mut pos = 0;
            for iv in covered_by_chr.get(chr.as_str()).into_iter().flatten() {
                if iv.start > pos {
                    result.push(Region::new(chr, pos, iv.start));
                }
                pos = iv.end;
            }
            if pos < size {
                result.push(Region::new(chr, pos, size));
            }
        }

        RegionSet::from(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn coords(rs: &RegionSet) -> Vec<(String, u32, u32)> {
        rs.regions
            .iter()
            .map(|r| (r.chr.clone(), r.start, r.end))
            .collect()
    }

    fn chrom_sizes() -> ChromSizes {
        ChromSizes::from([("chr1".to_string(), 100), ("chr2".to_string(), 50)])
    }

    // ── trim ─────────────────────────────────────────────────────────

    #[rstest]
    fn test_trim_clamps_and_drops() {
        let rs = make_regionset(vec![("chr1", 90, 120), ("chr1", 100, 110), ("chrX", 0, 5)]);
        assert_eq!(coords(&rs.trim(&chrom_sizes())), vec![("chr1".into(), 90, 100)]);
    }

    // ── reduce ───────────────────────────────────────────────────────

    #[rstest]
    fn test_reduce_merges_overlapping_and_adjacent() {
        let rs = make_regionset(vec![
            ("chr1", 15, 30),
            ("chr1", 0, 10),
            ("chr1", 10, 20),
            ("chr1", 40, 50),
            ("chr2", 0, 5),
        ]);

        assert_eq!(
            coords(&rs.reduce()),
            vec![
                ("chr1".into(), 0, 30),
                ("chr1".into(), 40, 50),
                ("chr2".into(), 0, 5),
            ]
        );
    }

    #[rstest]
    fn test_reduce_empty() {
        assert!(RegionSet::default().reduce().is_empty());
    }

    // ── setdiff ──────────────────────────────────────────────────────

    #[rstest]
    fn test_setdiff_middle_subtraction() {
        let a = make_regionset(vec![("chr1", 100, 200)]);
        let b = make_regionset(vec![("chr1", 120, 140), ("chr1", 160, 180)]);

        assert_eq!(
            coords(&a.setdiff(&b)),
            vec![
                ("chr1".into(), 100, 120),
                ("chr1".into(), 140, 160),
                ("chr1".into(), 180, 200),
            ]
        );
    }

    #[rstest]
    fn test_setdiff_complete_and_other_chrom() {
        let a = make_regionset(vec![("chr1", 10, 20), ("chr2", 10, 20)]);
        let b = make_regionset(vec![("chr1", 0, 50)]);
        assert_eq!(coords(&a.setdiff(&b)), vec![("chr2".into(), 10, 20)]);
    }

    // ── gaps ─────────────────────────────────────────────────────────

    #[rstest]
    fn test_gaps() {
        let rs = make_regionset(vec![("chr1", 0, 10), ("chr1", 50, 60)]);
        assert_eq!(
            coords(&rs.gaps(&chrom_sizes())),
            vec![
                ("chr1".into(), 10, 50),
                ("chr1".into(), 60, 100),
                ("chr2".into(), 0, 50),
            ]
        );
    }
}
