//! Overlap statistics runs.
//!
//! Inputs are validated against the genome, projected on it and merged,
//! then each analysis compares the true overlap with the overlaps of
//! shuffled copies produced by the minibatch scheduler.
use log::{info, warn};

use genolap_core::models::RegionSet;
use genolap_overlaprs::{
    OverlapCounts, compute_overlap, count_combinations, overlap_segments,
};

use crate::combinations::{CombinationKey, CombinationSelection, read_custom_combinations, select_combinations};
use crate::config::RunConfig;
use crate::errors::{GenolapStatsError, Result};
use crate::genome::Genome;
use crate::records::{OverlapSamples, OverlapStatRecord};
use crate::scheduler::{Experiment, Merge, MinibatchTask, Scheduler};
use crate::shuffle::ShuffleModel;

/// A reference set and the name it is reported under.
#[derive(Debug, Clone)]
pub struct LabeledSet {
    pub label: String,
    pub regions: RegionSet,
}

impl LabeledSet {
    pub fn new(label: &str, regions: RegionSet) -> Self {
        LabeledSet {
            label: label.to_string(),
            regions,
        }
    }
}

/// Validate, project and merge one input set.
fn prepare(genome: &Genome, set: &RegionSet, label: &str) -> Result<RegionSet> {
    genome.validate(set, label)?;
    let projected = genome.project(set);
    if projected.is_empty() {
        return Err(GenolapStatsError::Data(format!(
            "'{}' has no region left on the analysed genome",
            label
        )));
    }
    info!(
        "'{}': {} regions, {} bp after merging",
        label,
        projected.len(),
        projected.nucleotides_length()
    );
    Ok(projected)
}

fn shuffle_model(set: &RegionSet, genome: &Genome, config: &RunConfig) -> Result<ShuffleModel> {
    ShuffleModel::new(set, genome, config.use_markov)
}

/// Query and one reference shuffled independently.
struct PairwiseExperiment<'a> {
    query: &'a ShuffleModel,
    reference: ShuffleModel,
}

impl Experiment for PairwiseExperiment<'_> {
    type Summary = OverlapSamples;

    fn empty(&self) -> OverlapSamples {
        OverlapSamples::default()
    }

    fn run_minibatch(&self, task: &MinibatchTask) -> Result<OverlapSamples> {
        let mut rng = task.rng();
        let mut samples = OverlapSamples::default();
        for _ in 0..task.size {
            let query = self.query.sample(&mut rng);
            let reference = self.reference.sample(&mut rng);
            samples.push(compute_overlap(&query, &reference));
        }
        Ok(samples)
    }
}

/// Samples of every retained combination, in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CombinationSamples(Vec<OverlapSamples>);

impl Merge for CombinationSamples {
    fn merge(&mut self, other: Self) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0) {
            mine.merge(theirs);
        }
    }
}

/// Query and all references shuffled together.
struct MultipleExperiment<'a> {
    query: &'a ShuffleModel,
    references: &'a [ShuffleModel],
    keys: &'a [u64],
    exact: bool,
}

impl Experiment for MultipleExperiment<'_> {
    type Summary = CombinationSamples;

    fn empty(&self) -> CombinationSamples {
        CombinationSamples(vec![OverlapSamples::default(); self.keys.len()])
    }

    fn run_minibatch(&self, task: &MinibatchTask) -> Result<CombinationSamples> {
        let mut rng = task.rng();
        let mut samples = self.empty();
        for _ in 0..task.size {
            let query = self.query.sample(&mut rng);
            let references: Vec<RegionSet> =
                self.references.iter().map(|m| m.sample(&mut rng)).collect();
            let refs: Vec<&RegionSet> = references.iter().collect();

            let segments = overlap_segments(&query, &refs)?;
            let counts = count_combinations(&segments, self.keys, self.exact);
            for (sample, count) in samples.0.iter_mut().zip(counts) {
                sample.push(count);
            }
        }
        Ok(samples)
    }
}

fn warn_markov(config: &RunConfig) {
    if config.use_markov {
        warn!("Markov shuffling is in beta: it tends to bias the null model toward association");
    }
}

///
/// One record per reference set: overlap of the query with that reference
/// against the overlaps of independently shuffled copies of both.
///
pub fn run_pairwise(
    query: &RegionSet,
    references: &[LabeledSet],
    genome: &Genome,
    config: &RunConfig,
) -> Result<Vec<OverlapStatRecord>> {
    config.validate(references.len())?;
    warn_markov(config);

    let query = prepare(genome, query, "query")?;
    let query_model = shuffle_model(&query, genome, config)?;
    let prepared: Vec<(RegionSet, ShuffleModel)> = references
        .iter()
        .map(|reference| {
            let regions = prepare(genome, &reference.regions, &reference.label)?;
            let model = shuffle_model(&regions, genome, config)?;
            Ok((regions, model))
        })
        .collect::<Result<_>>()?;

    let scheduler = Scheduler::new(config)?;
    info!(
        "Running {} shuffles per reference on {} workers",
        config.shuffle_count(),
        scheduler.worker_count()
    );

    let mut records = Vec::with_capacity(references.len());
    for (stream, (reference, (regions, model))) in references.iter().zip(prepared).enumerate() {
        let observed = compute_overlap(&query, &regions);

        let experiment = PairwiseExperiment {
            query: &query_model,
            reference: model,
        };
        let samples = scheduler.run(stream as u64, &experiment, &reference.label)?;

        info!(
            "'{}': {} intersections, {} bp overlapping",
            reference.label, observed.n, observed.s
        );
        records.push(OverlapStatRecord::new(
            reference.label.clone(),
            observed,
            &samples,
        ));
    }

    Ok(records)
}

///
/// One record per retained combination of the query with reference sets.
///
/// Combinations are selected on the true data, then counted on the true
/// data and on every shuffle of the query and all references together.
///
pub fn run_multiple(
    query: &RegionSet,
    references: &[LabeledSet],
    genome: &Genome,
    config: &RunConfig,
) -> Result<Vec<OverlapStatRecord>> {
    config.validate(references.len())?;
    warn_markov(config);

    let query = prepare(genome, query, "query")?;
    let prepared: Vec<RegionSet> = references
        .iter()
        .map(|r| prepare(genome, &r.regions, &r.label))
        .collect::<Result<_>>()?;
    let labels: Vec<String> = references.iter().map(|r| r.label.clone()).collect();

    let refs: Vec<&RegionSet> = prepared.iter().collect();
    let segments = overlap_segments(&query, &refs)?;

    let custom = config
        .multiple_overlap
        .custom_combinations
        .as_deref()
        .map(|path| read_custom_combinations(path, references.len()))
        .transpose()?;
    let CombinationSelection { keys, exact } =
        select_combinations(&segments, references.len(), &config.multiple_overlap, custom);

    if keys.is_empty() {
        warn!("The query does not overlap any reference set: no combination to report");
        return Ok(Vec::new());
    }
    info!(
        "Reporting {} combinations ({} counting)",
        keys.len(),
        if exact { "exact" } else { "inexact" }
    );

    let masks: Vec<u64> = keys.iter().map(CombinationKey::mask).collect();
    let observed: Vec<OverlapCounts> = count_combinations(&segments, &masks, exact);

    let query_model = shuffle_model(&query, genome, config)?;
    let reference_models: Vec<ShuffleModel> = prepared
        .iter()
        .map(|r| shuffle_model(r, genome, config))
        .collect::<Result<_>>()?;

    let experiment = MultipleExperiment {
        query: &query_model,
        references: &reference_models,
        keys: &masks,
        exact,
    };
    let scheduler = Scheduler::new(config)?;
    let samples = scheduler.run(0, &experiment, "combinations")?;

    let records = keys
        .iter()
        .zip(observed)
        .zip(&samples.0)
        .map(|((key, counts), samples)| {
            OverlapStatRecord::new(key.label(&labels, exact), counts, samples)
        })
        .collect();

    Ok(records)
}
