use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum OverlapError {
    #[error("At most {max} reference sets can be combined, got {got}")]
    TooManyReferenceSets { got: usize, max: usize },
}
