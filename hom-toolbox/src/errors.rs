use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("No repeating peak structure found: fewer than 2 peaks pass the prominence and width cuts.")]
    NoPeaksFound,
    #[error("Peak spacing has no outlier gap; the zero-delay peak cannot be identified.")]
    AmbiguousCenter,
    #[error("{0}")]
    BaselineUndefined(String),
    #[error("{0}")]
    DegenerateGeometry(String),
    #[error("{0}")]
    InvalidHistogram(String),
}
