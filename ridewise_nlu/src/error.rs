use thiserror::Error;

/// Failures produced by the matching layer.
///
/// `NoConfidentMatch` and `NoFieldMatch` are expected outcomes that drive
/// clarification prompts; `DimensionMismatch` indicates a corpus/query
/// produced by a different embedding model and should not occur once the
/// corpora have passed load-time validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NluError {
    #[error("vector dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("no station matched the query with enough confidence")]
    NoConfidentMatch,

    #[error("no field descriptor matched the query")]
    NoFieldMatch,
}
