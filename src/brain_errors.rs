use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrainError {
    #[error("Malformed goal input: {0}")]
    InputParseError(String),

    #[error("Could not find goal file: {0}")]
    GoalFileNotFound(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Message is the user facing string written into the snapshot.
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    RoadConsistencyError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid quantile type: {0} (expected 1..=9)")]
    InvalidQuantileType(usize),

    #[error("Invalid processing configuration: {0}")]
    InvalidConfig(String),
}

impl PartialEq for BrainError {
    fn eq(&self, other: &Self) -> bool {
        use BrainError::*;
        match (self, other) {
            (InputParseError(a), InputParseError(b)) => a == b,
            (GoalFileNotFound(a), GoalFileNotFound(b)) => a == b,
            (ValidationError(a), ValidationError(b)) => a == b,
            (RoadConsistencyError(a), RoadConsistencyError(b)) => a == b,
            (ComputationError(a), ComputationError(b)) => a == b,
            (InvalidQuantileType(a), InvalidQuantileType(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,

            // wrapped errors are only compared by variant
            (IoError(_), IoError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
