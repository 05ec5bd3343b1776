//! Combinations of the query with reference sets.
//!
//! A [CombinationKey] is a membership mask over `[query, ref_1, ..., ref_k]`
//! whose query bit is always set. The keys reported by a multiple overlap
//! run are selected from the segments of the true (unshuffled) data.
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;
use std::path::Path;

use log::{info, warn};

use genolap_core::utils::get_dynamic_reader;
use genolap_overlaprs::Segment;
use genolap_overlaprs::segments::QUERY_BIT;

use crate::config::MultipleOverlapConfig;
use crate::errors::{GenolapStatsError, Result};
use crate::modl;

/// Display name of the query in combination labels.
pub const QUERY_LABEL: &str = "Query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinationKey(u64);

impl CombinationKey {
    /// Key of a membership mask, the query bit is forced.
    pub fn from_mask(mask: u64) -> Self {
        CombinationKey(mask | QUERY_BIT)
    }

    /// Key of the query with the given 0-based reference indices.
    pub fn from_references(indices: &[usize]) -> Self {
        let mask = indices.iter().fold(QUERY_BIT, |mask, &i| mask | 1 << (i + 1));
        CombinationKey(mask)
    }

    pub fn mask(&self) -> u64 {
        self.0
    }

    /// Mask of the references only, query bit cleared.
    pub fn reference_mask(&self) -> u64 {
        self.0 & !QUERY_BIT
    }

    /// Number of sets in the combination, the query included.
    pub fn size(&self) -> u32 {
        self.0.count_ones()
    }

    /// 0-based indices of the references of the combination.
    pub fn reference_indices(&self) -> impl Iterator<Item = usize> {
        let mask = self.reference_mask();
        (1..64).filter(move |bit| mask & (1 << bit) != 0).map(|bit| bit - 1)
    }

    ///
    /// Display form such as `[Query + A + B]`. Inexact combinations, which
    /// also count loci where more references are present, end with
    /// ` + ...` unless they already hold every reference.
    ///
    pub fn label(&self, labels: &[String], exact: bool) -> String {
        let mut parts = vec![QUERY_LABEL.to_string()];
        parts.extend(
            self.reference_indices()
                .map(|i| labels.get(i).cloned().unwrap_or_else(|| format!("ref_{}", i + 1))),
        );
        if !exact && (self.size() as usize) < labels.len() + 1 {
            parts.push("...".to_string());
        }
        format!("[{}]", parts.join(" + "))
    }
}

/// Keys retained for a multiple overlap run and how they are counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationSelection {
    pub keys: Vec<CombinationKey>,
    pub exact: bool,
}

/// Number of segments per observed mask.
pub fn observed_abundances(segments: &[Segment]) -> BTreeMap<u64, u64> {
    let mut abundances: BTreeMap<u64, u64> = BTreeMap::new();
    for segment in segments {
        *abundances.entry(segment.mask).or_default() += 1;
    }
    abundances
}

/// Every sub-combination of `key` holding the query and `size - 1`
/// references.
fn sub_combinations(key: CombinationKey, size: usize) -> Vec<CombinationKey> {
    fn extend(
        refs: &[usize],
        needed: usize,
        chosen: &mut Vec<usize>,
        out: &mut Vec<CombinationKey>,
    ) {
        if needed == 0 {
            out.push(CombinationKey::from_references(chosen));
            return;
        }
        for (i, &r) in refs.iter().enumerate() {
            if refs.len() - i < needed {
                break;
            }
            chosen.push(r);
            extend(&refs[i + 1..], needed - 1, chosen, out);
            chosen.pop();
        }
    }

    let refs: Vec<usize> = key.reference_indices().collect();
    let mut out = Vec::new();
    extend(&refs, size.saturating_sub(1), &mut Vec::new(), &mut out);
    out
}

fn sort_keys(keys: impl IntoIterator<Item = CombinationKey>) -> Vec<CombinationKey> {
    let unique: BTreeSet<CombinationKey> = keys.into_iter().collect();
    let mut keys: Vec<CombinationKey> = unique.into_iter().collect();
    keys.sort_by_key(|k| (k.size(), k.reference_indices().collect::<Vec<_>>()));
    keys
}

///
/// Pick the combinations to report from the true segments.
///
/// - custom combinations, when given, are used as is and counted exactly;
/// - without any restriction every observed combination is reported,
///   counted inexactly: A+B+C also counts toward A+B+...;
/// - with MODL, the dictionary words are reported;
/// - with a target size `k`, larger combinations are replaced by their
///   sub-combinations of size `k`. Counting is exact only when `k` covers
///   the query and all references.
///
pub fn select_combinations(
    segments: &[Segment],
    reference_count: usize,
    config: &MultipleOverlapConfig,
    custom: Option<Vec<CombinationKey>>,
) -> CombinationSelection {
    if let Some(custom) = custom {
        return CombinationSelection {
            keys: sort_keys(custom),
            exact: true,
        };
    }

    let abundances = observed_abundances(segments);

    let words: Vec<CombinationKey> = match config.max_combinations {
        Some(max_words) => {
            let rows: Vec<(u64, u64)> = abundances
                .iter()
                .map(|(&mask, &count)| (mask & !QUERY_BIT, count))
                .collect();
            let selected = modl::select_words(&rows, max_words, config.modl_min_ratio);
            info!(
                "MODL kept {} combinations out of {} observed",
                selected.len(),
                rows.len()
            );
            selected.into_iter().map(CombinationKey::from_mask).collect()
        }
        None => abundances.keys().map(|&m| CombinationKey::from_mask(m)).collect(),
    };

    let full_size = reference_count + 1;
    let (keys, exact) = match config.target_combi_size {
        None => (words, false),
        Some(size) if size >= full_size => (words, true),
        Some(size) => {
            let keys = words
                .into_iter()
                .flat_map(|key| match key.size() as usize > size {
                    true => sub_combinations(key, size),
                    false => vec![key],
                })
                .collect();
            (keys, false)
        }
    };

    CombinationSelection {
        keys: sort_keys(keys),
        exact,
    }
}

///
/// Read a custom combination matrix: one combination per line, made of
/// whitespace separated 0/1 flags for `[query, ref_1, ..., ref_k]`.
///
/// Rows without the query or without any reference are dropped with a
/// warning.
///
pub fn read_custom_combinations(path: &Path, reference_count: usize) -> Result<Vec<CombinationKey>> {
    let reader = get_dynamic_reader(path).map_err(|e| {
        GenolapStatsError::Config(format!(
            "cannot read custom combinations {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut keys = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let flags: Vec<&str> = line.split_whitespace().collect();
        if flags.len() != reference_count + 1 {
            return Err(GenolapStatsError::Config(format!(
                "custom combinations line {}: expected {} columns (query and {} references), found {}",
                idx + 1,
                reference_count + 1,
                reference_count,
                flags.len()
            )));
        }

        let mut mask = 0u64;
        for (bit, flag) in flags.iter().enumerate() {
            match *flag {
                "1" => mask |= 1 << bit,
                "0" => {}
                other => {
                    return Err(GenolapStatsError::Config(format!(
                        "custom combinations line {}: expected 0 or 1, found '{}'",
                        idx + 1,
                        other
                    )));
                }
            }
        }

        if mask & QUERY_BIT == 0 {
            warn!(
                "Custom combination on line {} does not include the query and is ignored",
                idx + 1
            );
            continue;
        }
        if mask == QUERY_BIT {
            warn!(
                "Custom combination on line {} has no reference set and is ignored",
                idx + 1
            );
            continue;
        }
        keys.push(CombinationKey(mask));
    }

    if keys.is_empty() {
        return Err(GenolapStatsError::Config(format!(
            "no usable combination in {}",
            path.display()
        )));
    }

    Ok(keys)
}
