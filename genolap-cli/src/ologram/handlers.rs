use std::collections::HashSet;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use log::{info, warn};

use genolap_core::models::RegionSet;
use genolap_core::utils::{label_from_path, read_chrom_sizes};
use genolap_stats::errors::GenolapStatsError;
use genolap_stats::output::{write_json_file, write_tsv, write_tsv_file};
use genolap_stats::{
    Genome, LabeledSet, RunConfig, StatColumn, run_multiple, run_pairwise, sort_records,
};

pub fn run_ologram(matches: &ArgMatches) -> Result<()> {
    let query_file = matches
        .get_one::<PathBuf>("query")
        .ok_or_else(|| anyhow!("A path to a query file is required."))?;
    let ref_files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("refs")
        .ok_or_else(|| anyhow!("At least one reference file is required."))?
        .cloned()
        .collect();
    let labels: Option<Vec<String>> = matches
        .get_many::<String>("labels")
        .map(|values| values.cloned().collect());

    let config = load_config(matches)?;
    let labels = resolve_labels(&ref_files, labels)?;
    let genome = build_genome(matches)?;
    let force_chrom = matches.get_flag("force-chrom");

    let query = load_regions(query_file, "query", &genome, force_chrom)?;
    let references = ref_files
        .iter()
        .zip(labels)
        .map(|(path, label)| {
            let regions = load_regions(path, &label, &genome, force_chrom)?;
            Ok(LabeledSet { label, regions })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut records = match config.multiple_overlap.enabled {
        true => run_multiple(&query, &references, &genome, &config)?,
        false => run_pairwise(&query, &references, &genome, &config)?,
    };

    if let Some(column) = config.sort_by {
        sort_records(&mut records, column);
    }

    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            write_tsv_file(&records, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} records to {}", records.len(), path.display());
        }
        None => write_tsv(&records, BufWriter::new(io::stdout().lock()))?,
    }

    if let Some(path) = matches.get_one::<PathBuf>("json") {
        write_json_file(&records, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

/// Configuration file (or defaults) with the command line flags applied on top.
fn load_config(matches: &ArgMatches) -> Result<RunConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(&count) = matches.get_one::<usize>("minibatch-count") {
        config.minibatch_count = count;
    }
    if let Some(&size) = matches.get_one::<usize>("minibatch-size") {
        config.minibatch_size = size;
    }
    if let Some(&threads) = matches.get_one::<usize>("threads") {
        config.worker_count = threads;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if matches.get_flag("use-markov") {
        config.use_markov = true;
    }
    if matches.get_flag("no-progress") {
        config.show_progress = false;
    }
    if let Some(column) = matches.get_one::<String>("sort-features") {
        config.sort_by = Some(column.parse::<StatColumn>()?);
    }

    let mo = &mut config.multiple_overlap;
    if matches.get_flag("multiple-overlap") {
        mo.enabled = true;
    }
    if let Some(&size) = matches.get_one::<usize>("target-combi-size") {
        mo.target_combi_size = Some(size);
    }
    if let Some(&max) = matches.get_one::<usize>("max-combis") {
        mo.max_combinations = Some(max);
    }
    if let Some(&ratio) = matches.get_one::<f64>("modl-min-ratio") {
        mo.modl_min_ratio = ratio;
    }
    if let Some(path) = matches.get_one::<PathBuf>("custom-combis") {
        mo.custom_combinations = Some(path.clone());
    }

    Ok(config)
}

fn build_genome(matches: &ArgMatches) -> Result<Genome> {
    let sizes_file = matches
        .get_one::<PathBuf>("chrom-sizes")
        .ok_or_else(|| anyhow!("A chrom sizes file is required."))?;
    let chrom_sizes = read_chrom_sizes(sizes_file)?;

    let exclusion = matches.get_one::<PathBuf>("bed-excl");
    let inclusion = matches.get_one::<PathBuf>("bed-incl");

    let genome = match (exclusion, inclusion) {
        (Some(_), Some(_)) => {
            return Err(GenolapStatsError::Config(
                "--bed-excl and --bed-incl cannot be used together".to_string(),
            )
            .into());
        }
        (Some(path), None) => Genome::with_exclusion(chrom_sizes, &read_bed(path)?),
        (None, Some(path)) => Genome::with_inclusion(chrom_sizes, &read_bed(path)?),
        (None, None) => Genome::new(chrom_sizes),
    };

    info!(
        "Genome of {} chromosomes, {} bp analysed",
        genome.effective_sizes().len(),
        genome.effective_length()
    );
    Ok(genome)
}

fn read_bed(path: &Path) -> Result<RegionSet> {
    RegionSet::try_from(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_regions(path: &Path, label: &str, genome: &Genome, force_chrom: bool) -> Result<RegionSet> {
    let regions = read_bed(path)?;
    let regions = match force_chrom {
        true => genome.restrict(&regions, label),
        false => regions,
    };

    if regions.is_empty() {
        return Err(GenolapStatsError::Data(format!(
            "'{}' has no region on the chromosomes of the genome",
            label
        ))
        .into());
    }
    Ok(regions)
}

///
/// Labels of the reference sets: the given ones, checked, or the file names
/// without extensions.
///
fn resolve_labels(
    paths: &[PathBuf],
    labels: Option<Vec<String>>,
) -> std::result::Result<Vec<String>, GenolapStatsError> {
    let labels = match labels {
        Some(labels) => {
            if labels.len() != paths.len() {
                return Err(GenolapStatsError::Config(format!(
                    "{} labels given for {} reference files",
                    labels.len(),
                    paths.len()
                )));
            }
            labels
        }
        None => {
            let labels: Vec<String> = paths.iter().map(|p| label_from_path(p)).collect();
            warn!(
                "No labels given, using the file names: {}",
                labels.join(", ")
            );
            labels
        }
    };

    let mut seen = HashSet::new();
    for label in &labels {
        if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GenolapStatsError::Config(format!(
                "label '{}' may only contain letters, digits and '_'",
                label
            )));
        }
        if !seen.insert(label.as_str()) {
            return Err(GenolapStatsError::Config(format!(
                "label '{}' is used more than once",
                label
            )));
        }
    }

    Ok(labels)
}
