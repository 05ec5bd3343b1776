use genolap_overlaprs::OverlapError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenolapStatsError {
    /// Inconsistent or unusable run parameters, detected before simulating.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Input sets that cannot be analysed against the genome.
    #[error("Invalid input data: {0}")]
    Data(String),

    #[error("Minibatch {index} failed: {source}")]
    Minibatch {
        index: usize,
        #[source]
        source: Box<GenolapStatsError>,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Overlap(#[from] OverlapError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenolapStatsError>;
