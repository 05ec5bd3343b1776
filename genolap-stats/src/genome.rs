//! Genome model: chromosome sizes with an optional exclusion mask.
//!
//! Excluded positions are cut out of the genome. Every region set analysed
//! against a masked genome is projected into the remaining sub-genome:
//! masked positions are removed and the coordinates after them are shifted
//! left, so that each chromosome becomes the concatenation of its kept
//! pieces.
use std::collections::BTreeMap;

use log::{info, warn};

use genolap_core::ChromSizes;
use genolap_core::models::{Region, RegionSet};

use crate::errors::{GenolapStatsError, Result};
use crate::interval_ranges::IntervalRanges;

/// Sorted mask intervals of one chromosome with the excluded length
/// accumulated before each of them.
#[derive(Debug, Clone, Default)]
struct ChromMask {
    ends: Vec<u32>,
    excluded_before: Vec<u64>,
}

impl ChromMask {
    /// Excluded bp located before `pos`, which must not be masked.
    fn shift_at(&self, pos: u32) -> u64 {
        let idx = self.ends.partition_point(|&end| end <= pos);
        self.excluded_before[idx]
    }
}

#[derive(Debug, Clone)]
pub struct Genome {
    chrom_sizes: ChromSizes,
    effective_sizes: ChromSizes,
    exclusion: Option<RegionSet>,
    masks: BTreeMap<String, ChromMask>,
}

impl Genome {
    pub fn new(chrom_sizes: ChromSizes) -> Self {
        let effective_sizes = chrom_sizes
            .iter()
            .filter(|(_, size)| **size > 0)
            .map(|(chr, size)| (chr.clone(), *size))
            .collect();

        Genome {
            chrom_sizes,
            effective_sizes,
            exclusion: None,
            masks: BTreeMap::new(),
        }
    }

    ///
    /// Genome without the positions covered by `mask`.
    ///
    /// The mask is merged and clipped to the chromosomes. A chromosome
    /// entirely covered by the mask is removed from the model.
    ///
    pub fn with_exclusion(chrom_sizes: ChromSizes, mask: &RegionSet) -> Self {
        let mask = mask.trim(&chrom_sizes).reduce();

        let mut masks: BTreeMap<String, ChromMask> = BTreeMap::new();
        let mut excluded: BTreeMap<&str, u64> = BTreeMap::new();
        for region in &mask.regions {
            let chrom_mask = masks.entry(region.chr.clone()).or_insert_with(|| ChromMask {
                ends: Vec::new(),
                excluded_before: vec![0],
            });
            let total = excluded.entry(region.chr.as_str()).or_default();
            *total += region.width() as u64;
            chrom_mask.ends.push(region.end);
            chrom_mask.excluded_before.push(*total);
        }

        let mut effective_sizes = ChromSizes::new();
        for (chr, &size) in &chrom_sizes {
            let kept = size as u64 - excluded.get(chr.as_str()).copied().unwrap_or(0);
            if kept == 0 {
                info!("Chromosome {} is fully excluded", chr);
                continue;
            }
            effective_sizes.insert(chr.clone(), kept as u32);
        }

        info!(
            "Excluding {} bp of the genome ({} regions)",
            mask.nucleotides_length(),
            mask.len()
        );

        Genome {
            chrom_sizes,
            effective_sizes,
            exclusion: Some(mask),
            masks,
        }
    }

    /// Genome restricted to the positions covered by `keep`.
    pub fn with_inclusion(chrom_sizes: ChromSizes, keep: &RegionSet) -> Self {
        let mask = keep.gaps(&chrom_sizes);
        Genome::with_exclusion(chrom_sizes, &mask)
    }

    pub fn chrom_sizes(&self) -> &ChromSizes {
        &self.chrom_sizes
    }

    /// Chromosome lengths once the mask is removed, fully excluded
    /// chromosomes omitted.
    pub fn effective_sizes(&self) -> &ChromSizes {
        &self.effective_sizes
    }

    pub fn effective_size(&self, chr: &str) -> Option<u32> {
        self.effective_sizes.get(chr).copied()
    }

    pub fn exclusion(&self) -> Option<&RegionSet> {
        self.exclusion.as_ref()
    }

    pub fn effective_length(&self) -> u64 {
        self.effective_sizes.values().map(|&s| s as u64).sum()
    }

    ///
    /// Check that every region of `set` lies on a known chromosome and
    /// within its bounds.
    ///
    pub fn validate(&self, set: &RegionSet, label: &str) -> Result<()> {
        for region in &set.regions {
            let Some(&size) = self.chrom_sizes.get(&region.chr) else {
                return Err(GenolapStatsError::Config(format!(
                    "chromosome {} of '{}' is not in the chromosome sizes",
                    region.chr, label
                )));
            };
            if region.end > size {
                return Err(GenolapStatsError::Data(format!(
                    "region {}:{}-{} of '{}' ends after its chromosome ({} bp)",
                    region.chr, region.start, region.end, label, size
                )));
            }
        }
        Ok(())
    }

    ///
    /// Drop the regions located on chromosomes absent from the chromosome
    /// sizes.
    ///
    pub fn restrict(&self, set: &RegionSet, label: &str) -> RegionSet {
        let regions: Vec<Region> = set
            .regions
            .iter()
            .filter(|r| self.chrom_sizes.contains_key(&r.chr))
            .cloned()
            .collect();

        let dropped = set.len() - regions.len();
        if dropped > 0 {
            warn!(
                "Dropped {} regions of '{}' located on chromosomes without a size",
                dropped, label
            );
        }

        RegionSet {
            regions,
            header: set.header.clone(),
            path: set.path.clone(),
        }
    }

    ///
    /// Coordinates of `set` in the sub-genome left by the mask, merged.
    ///
    /// Without a mask this only merges the set.
    ///
    pub fn project(&self, set: &RegionSet) -> RegionSet {
        let Some(mask) = &self.exclusion else {
            return set.reduce();
        };

        let kept = set.setdiff(mask);
        let shifted: Vec<Region> = kept
            .regions
            .iter()
            .filter(|r| self.effective_sizes.contains_key(&r.chr))
            .map(|r| {
                let shift = self.masks.get(&r.chr).map_or(0, |m| m.shift_at(r.start)) as u32;
                Region::new(&r.chr, r.start - shift, r.end - shift)
            })
            .collect();

        RegionSet::from(shifted).reduce()
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

    #[fixture]
    fn chrom_sizes() -> ChromSizes {
        ChromSizes::from([("chr1".to_string(), 1000), ("chr2".to_string(), 500)])
    }

    #[rstest]
    fn test_unmasked_genome(chrom_sizes: ChromSizes) {
        let genome = Genome::new(chrom_sizes);
        assert_eq!(genome.effective_length(), 1500);

        let set = make_regionset(vec![("chr1", 10, 20), ("chr1", 15, 30)]);
        assert_eq!(coords(&genome.project(&set)), vec![("chr1".into(), 10, 30)]);
    }

    #[rstest]
    fn test_exclusion_shifts_coordinates(chrom_sizes: ChromSizes) {
        let mask = make_regionset(vec![("chr1", 100, 200), ("chr1", 500, 600), ("chr1", 950, 2000)]);
        let genome = Genome::with_exclusion(chrom_sizes, &mask);

        assert_eq!(genome.effective_size("chr1"), Some(750));
        assert_eq!(genome.effective_size("chr2"), Some(500));

        let set = make_regionset(vec![
            ("chr1", 50, 150),
            ("chr1", 250, 300),
            ("chr1", 550, 700),
            ("chr2", 10, 20),
        ]);
        assert_eq!(
            coords(&genome.project(&set)),
            vec![
                ("chr1".into(), 50, 100),
                ("chr1".into(), 150, 200),
                ("chr1".into(), 400, 500),
                ("chr2".into(), 10, 20),
            ]
        );
    }

    #[rstest]
    fn test_pieces_around_a_mask_are_joined(chrom_sizes: ChromSizes) {
        let mask = make_regionset(vec![("chr1", 100, 200)]);
        let genome = Genome::with_exclusion(chrom_sizes, &mask);

        let set = make_regionset(vec![("chr1", 50, 250)]);
        assert_eq!(coords(&genome.project(&set)), vec![("chr1".into(), 50, 150)]);
    }

    #[rstest]
    fn test_fully_excluded_chromosome(chrom_sizes: ChromSizes) {
        let mask = make_regionset(vec![("chr2", 0, 500)]);
        let genome = Genome::with_exclusion(chrom_sizes, &mask);

        assert_eq!(genome.effective_size("chr2"), None);
        let set = make_regionset(vec![("chr1", 0, 10), ("chr2", 10, 20)]);
        assert_eq!(coords(&genome.project(&set)), vec![("chr1".into(), 0, 10)]);
    }

    #[rstest]
    fn test_inclusion_is_the_complement(chrom_sizes: ChromSizes) {
        let keep = make_regionset(vec![("chr1", 100, 300)]);
        let genome = Genome::with_inclusion(chrom_sizes, &keep);

        assert_eq!(genome.effective_size("chr1"), Some(200));
        assert_eq!(genome.effective_size("chr2"), None);

        let set = make_regionset(vec![("chr1", 250, 400)]);
        assert_eq!(coords(&genome.project(&set)), vec![("chr1".into(), 150, 200)]);
    }

    #[rstest]
    fn test_validate(chrom_sizes: ChromSizes) {
        let genome = Genome::new(chrom_sizes);
        assert!(genome.validate(&make_regionset(vec![("chr2", 0, 500)]), "ok").is_ok());
        assert!(matches!(
            genome.validate(&make_regionset(vec![("chr2", 0, 501)]), "long"),
            Err(GenolapStatsError::Data(_))
        ));
        assert!(matches!(
            genome.validate(&make_regionset(vec![("chrUn", 0, 1)]), "unknown"),
            Err(GenolapStatsError::Config(_))
        ));
    }

    #[rstest]
    fn test_restrict(chrom_sizes: ChromSizes) {
        let genome = Genome::new(chrom_sizes);
        let set = make_regionset(vec![("chr1", 0, 10), ("chrUn", 0, 10)]);
        assert_eq!(coords(&genome.restrict(&set, "peaks")), vec![("chr1".into(), 0, 10)]);
    }
}
