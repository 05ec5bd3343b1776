use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenolapCoreError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing region at line {line}: {reason}")]
    RegionParseError { line: usize, reason: String },

    #[error("Corrupted file. 0 regions found in the file: {0}")]
    EmptyRegionSet(String),

    #[error("Error parsing chrom sizes at line {line}: {reason}")]
    ChromSizesParseError { line: usize, reason: String },

    #[error("Duplicated chromosome in chrom sizes: {0}")]
    DuplicatedChromosome(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
