use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::warn;

use crate::errors::GenolapCoreError;
use crate::models::{Interval, Region};
use crate::utils::get_dynamic_reader;

///
/// RegionSet struct, the representation of the interval region set file,
/// such as bed file.
///
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub header: Option<String>,
    pub path: Option<PathBuf>,
}

fn parse_coordinate(field: Option<&str>, line: usize, name: &str) -> Result<u32> {
    let field = field.ok_or_else(|| GenolapCoreError::RegionParseError {
        line,
        reason: format!("missing {} column", name),
    })?;
    let value = field
        .trim()
        .parse::<u32>()
        .map_err(|_| GenolapCoreError::RegionParseError {
            line,
            reason: format!("invalid {} position '{}'", name, field),
        })?;
    Ok(value)
}

impl TryFrom<&Path> for RegionSet {
    type Error = anyhow::Error;

    ///
    /// Create a new [RegionSet] from a bed file (plain or gzip'd).
    ///
    /// # Arguments:
    /// - value: path to bed file on disk.
    fn try_from(value: &Path) -> Result<Self> {
        if !value.is_file() {
            return Err(GenolapCoreError::FileReadError(value.display().to_string()).into());
        }
        let reader = get_dynamic_reader(value)?;

        let mut regions: Vec<Region> = Vec::new();
        let mut header = String::new();
        let mut first_line = true;
        let mut empty_regions = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with("browser") || line.starts_with("track") || line.starts_with('#')
            {
                header.push_str(&line);
                first_line = false;
                continue;
            }

            let mut parts = line.split('\t');
            let chr = parts.next().unwrap_or_default();
            let start_field = parts.next();

            // column headers like `chr start end` without a leading #
            if first_line {
                first_line = false;
                if start_field.is_some_and(|s| s.trim().parse::<u32>().is_err()) {
                    header.push_str(&line);
                    continue;
                }
            }

            let start = parse_coordinate(start_field, idx + 1, "start")?;
            let end = parse_coordinate(parts.next(), idx + 1, "end")?;
            if end < start {
                return Err(GenolapCoreError::RegionParseError {
                    line: idx + 1,
                    reason: format!("end {} is before start {}", end, start),
                }
                .into());
            }
            if end == start {
                empty_regions += 1;
                continue;
            }

            let rest: Vec<&str> = parts.collect();
            regions.push(Region {
                chr: chr.to_string(),
                start,
                end,
                rest: Some(rest.join("\t")).filter(|s| !s.is_empty()),
            });
        }

        if empty_regions > 0 {
            warn!(
                "Skipped {} zero-length regions in {}",
                empty_regions,
                value.display()
            );
        }

        if regions.is_empty() {
            return Err(GenolapCoreError::EmptyRegionSet(value.display().to_string()).into());
        }

        let mut rs = RegionSet {
            regions,
            header: match header.is_empty() {
                true => None,
                false => Some(header),
            },
            path: Some(value.to_owned()),
        };
        rs.sort();

        Ok(rs)
    }
}

impl TryFrom<&str> for RegionSet {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        RegionSet::try_from(Path::new(value))
    }
}

impl TryFrom<String> for RegionSet {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        RegionSet::try_from(Path::new(&value))
    }
}

impl TryFrom<PathBuf> for RegionSet {
    type Error = anyhow::Error;

    fn try_from(value: PathBuf) -> Result<Self> {
        RegionSet::try_from(value.as_path())
    }
}

impl From<Vec<Region>> for RegionSet {
    fn from(regions: Vec<Region>) -> Self {
        RegionSet {
            regions,
            header: None,
            path: None,
        }
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

impl RegionSet {
    ///
    /// Sort regions by chromosome, start and end.
    /// Sorting is happening inside the object,
    /// where original order will be overwritten
    ///
    pub fn sort(&mut self) {
        self.regions.sort_by(|a, b| {
            a.chr
                .cmp(&b.chr)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.end.cmp(&b.end))
        });
    }

    ///
    /// Iterate unique chromosomes located in RegionSet, in name order
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &String> {
        let unique_chroms: BTreeSet<&String> = self.regions.iter().map(|r| &r.chr).collect();
        unique_chroms.into_iter()
    }

    ///
    /// Iterate through regions located on specific Chromosome in RegionSet
    ///
    /// # Arguments
    /// - chr: chromosome name
    ///
    pub fn iter_chr_regions<'a>(&'a self, chr: &'a str) -> impl Iterator<Item = &'a Region> {
        self.regions.iter().filter(move |r| r.chr == chr)
    }

    ///
    /// Coordinates grouped per chromosome, each list sorted by start.
    ///
    pub fn intervals_by_chrom(&self) -> BTreeMap<&str, Vec<Interval<u32, ()>>> {
        let mut grouped: BTreeMap<&str, Vec<Interval<u32, ()>>> = BTreeMap::new();
        for region in &self.regions {
            grouped
                .entry(region.chr.as_str())
                .or_default()
                .push(region.as_interval());
        }
        for intervals in grouped.values_mut() {
            intervals.sort();
        }
        grouped
    }

    ///
    /// Number of regions on each chromosome
    ///
    pub fn counts_by_chrom(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for region in &self.regions {
            *counts.entry(region.chr.as_str()).or_default() += 1;
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    ///
    /// Get number of regions in RegionSet
    ///
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    ///
    /// Get total nucleotide count
    ///
    pub fn nucleotides_length(&self) -> u64 {
        self.regions.iter().map(|r| r.width() as u64).sum()
    }
}

impl Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionSet with {} regions.", self.len())
    }
}
