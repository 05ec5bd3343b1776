use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::errors::GenolapCoreError;

/// Chromosome name to chromosome length, iterated in name order.
pub type ChromSizes = BTreeMap<String, u32>;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Read a two column chrom sizes file (`chrom<TAB>length`).
///
/// Blank lines and lines starting with `#` are skipped, extra columns are
/// ignored.
///
pub fn read_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<ChromSizes> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)
        .with_context(|| format!("Failed to open chrom sizes file: {}", path.display()))?;

    let mut chrom_sizes = ChromSizes::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(chrom), Some(size)) = (parts.next(), parts.next()) else {
            return Err(GenolapCoreError::ChromSizesParseError {
                line: idx + 1,
                reason: format!("expected two columns, found '{}'", line),
            }
            .into());
        };

        let size = size
            .parse::<u32>()
            .map_err(|e| GenolapCoreError::ChromSizesParseError {
                line: idx + 1,
                reason: format!("invalid length '{}': {}", size, e),
            })?;

        if chrom_sizes.insert(chrom.to_string(), size).is_some() {
            return Err(GenolapCoreError::DuplicatedChromosome(chrom.to_string()).into());
        }
    }

    Ok(chrom_sizes)
}

///
/// File name without any of its extensions: `dir/peaks.sorted.bed.gz` gives
/// `peaks`.
///
pub fn remove_all_extensions(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return String::new();
    };
    let mut stem = Path::new(name).to_path_buf();
    while stem.extension().is_some() {
        stem = stem.with_extension("");
    }

    stem.to_string_lossy().to_string()
}

///
/// Label usable as a feature name: the file name without extensions, with
/// every non alphanumeric character replaced by `_`.
///
pub fn label_from_path(path: &Path) -> String {
    remove_all_extensions(path)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
