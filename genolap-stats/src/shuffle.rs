//! Random placement of region sets along the genome.
//!
//! On each chromosome a set is seen as an alternation of gaps and regions:
//! `gap_0, len_1, gap_1, ..., len_n, gap_n`. A shuffle draws new lengths and
//! gaps and lays the regions again from left to right, so the number of
//! regions per chromosome never changes and no region can cross a
//! chromosome end.
//!
//! - Independent mode permutes the observed lengths and the observed gaps
//!   separately. Both multisets are kept exactly.
//! - Markov mode samples both sequences from order-2 Markov chains fitted
//!   on the observed ones, then rescales them to fill the chromosome.
use log::warn;
use rand::Rng;
use rand::seq::SliceRandom;

use genolap_core::models::{Region, RegionSet};

use crate::errors::{GenolapStatsError, Result};
use crate::genome::Genome;
use crate::markov::MarkovChain;

#[derive(Debug, Clone)]
struct ChromLayout {
    chr: String,
    size: u32,
    lengths: Vec<u32>,
    gaps: Vec<u32>,
    chains: Option<(MarkovChain, MarkovChain)>,
}

impl ChromLayout {
    fn sample<R: Rng>(&self, rng: &mut R, out: &mut Vec<Region>) {
        let (lengths, gaps) = match &self.chains {
            None => {
                let mut lengths = self.lengths.clone();
                let mut gaps = self.gaps.clone();
                lengths.shuffle(rng);
                gaps.shuffle(rng);
                (lengths, gaps)
            }
            Some((length_chain, gap_chain)) => {
                let mut lengths = length_chain.sample(self.lengths.len(), rng);
                let mut gaps = gap_chain.sample(self.gaps.len(), rng);

                let total: u64 = lengths.iter().map(|&l| l as u64).sum();
                if total > self.size as u64 {
                    rescale(&mut lengths, self.size as u64, 1);
                }
                let covered: u64 = lengths.iter().map(|&l| l as u64).sum();
                rescale(&mut gaps, self.size as u64 - covered, 0);
                (lengths, gaps)
            }
        };

        let mut pos = 0u32;
        for (length, gap) in lengths.iter().zip(&gaps) {
            let start = pos + gap;
            out.push(Region::new(&self.chr, start, start + length));
            pos = start + length;
        }
    }
}

///
/// Scale `values` so that they sum to `target`, keeping each one at least
/// `floor`. `target` must be at least `floor * values.len()`.
///
fn rescale(values: &mut [u32], target: u64, floor: u32) {
    if values.is_empty() {
        return;
    }
    let total: u64 = values.iter().map(|&v| v as u64).sum();
    if total == target {
        return;
    }

    let count = values.len() as u64;
    if total == 0 {
        for (i, value) in values.iter_mut().enumerate() {
            *value = (target / count + u64::from((i as u64) < target % count)) as u32;
        }
        return;
    }

    for value in values.iter_mut() {
        let scaled = (*value as u128 * target as u128 / total as u128) as u32;
        *value = scaled.max(floor);
    }

    // flooring leaves a deficit below one unit per value
    let mut current: u64 = values.iter().map(|&v| v as u64).sum();
    let mut idx = 0;
    while current < target {
        values[idx % values.len()] += 1;
        current += 1;
        idx += 1;
    }
    // the floor may have pushed the sum above the target
    while current > target {
        let mut progressed = false;
        for value in values.iter_mut() {
            if current == target {
                break;
            }
            if *value > floor {
                *value -= 1;
                current -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

/// Per-chromosome lengths and gaps of a region set, prepared once and
/// sampled for every shuffle.
#[derive(Debug, Clone)]
pub struct ShuffleModel {
    layouts: Vec<ChromLayout>,
}

impl ShuffleModel {
    ///
    /// Prepare the shuffling of `set`, a merged set already projected on
    /// `genome`.
    ///
    pub fn new(set: &RegionSet, genome: &Genome, use_markov: bool) -> Result<Self> {
        let mut layouts = Vec::new();

        for (chr, intervals) in set.intervals_by_chrom() {
            let size = genome.effective_size(chr).ok_or_else(|| {
                GenolapStatsError::Data(format!("chromosome {} is not part of the genome", chr))
            })?;

            let mut lengths = Vec::with_capacity(intervals.len());
            let mut gaps = Vec::with_capacity(intervals.len() + 1);
            let mut pos = 0u32;
            for iv in &intervals {
                if iv.start < pos || iv.end > size {
                    return Err(GenolapStatsError::Data(format!(
                        "region {}:{}-{} overlaps another region or exceeds the chromosome ({} bp)",
                        chr, iv.start, iv.end, size
                    )));
                }
                gaps.push(iv.start - pos);
                lengths.push(iv.width());
                pos = iv.end;
            }
            gaps.push(size - pos);

            let chains = use_markov.then(|| (MarkovChain::fit(&lengths), MarkovChain::fit(&gaps)));
            layouts.push(ChromLayout {
                chr: chr.to_string(),
                size,
                lengths,
                gaps,
                chains,
            });
        }

        Ok(ShuffleModel { layouts })
    }

    /// One shuffled copy of the set, sorted by chromosome and start.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> RegionSet {
        let mut regions = Vec::with_capacity(self.len());
        for layout in &self.layouts {
            layout.sample(rng, &mut regions);
        }
        RegionSet::from(regions)
    }

    /// Number of regions of the modelled set.
    pub fn len(&self) -> usize {
        self.layouts.iter().map(|l| l.lengths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

///
/// Shuffle `set` across `genome` once.
///
/// Prefer building a [ShuffleModel] when the same set is shuffled many
/// times.
///
pub fn shuffle<R: Rng>(
    set: &RegionSet,
    genome: &Genome,
    rng: &mut R,
    use_markov: bool,
) -> Result<RegionSet> {
    if use_markov {
        warn!("Markov shuffling is in beta: it tends to bias the null model toward association");
    }
    Ok(ShuffleModel::new(set, genome, use_markov)?.sample(rng))
}
