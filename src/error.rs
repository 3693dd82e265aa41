//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised while validating inputs or running a simulation.
///
/// Validation is eager: every check happens before any sampling work starts,
/// so an `Err` never comes with partial results.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum McmcError {
    /// A weight or matrix entry is negative, zero where positivity is required, or not finite.
    #[error("invalid {what} at {location}: {value}")]
    InvalidInput {
        what: &'static str,
        location: String,
        value: f64,
    },

    /// The proposal matrix is not square, or its size does not match the number of weights.
    #[error("expected a {expected}x{expected} proposal matrix, got {rows}x{cols}")]
    DimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// A column of the proposal matrix does not sum to one.
    #[error("column {column} of the proposal matrix sums to {sum}, expected 1")]
    NotStochastic { column: usize, sum: f64 },

    /// A proposal row does not sum to one, so the chain would not sample the row as given.
    #[error("row {row} of the proposal matrix sums to {sum}, expected 1")]
    NotRowStochastic { row: usize, sum: f64 },

    /// A proposal row has no positive mass, so no candidate can be drawn from it.
    #[error("proposal row {row} has no positive weight to sample from")]
    InvalidDistribution { row: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The run was cancelled before `iteration` was started.
    #[error("simulation cancelled before iteration {iteration}")]
    Cancelled { iteration: usize },

    #[cfg(feature = "csv")]
    #[error("i/o error: {0}")]
    Io(String),

    #[cfg(feature = "csv")]
    #[error("csv error: {0}")]
    Csv(String),
}

#[cfg(feature = "csv")]
impl From<std::io::Error> for McmcError {
    fn from(err: std::io::Error) -> Self {
        McmcError::Io(err.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for McmcError {
    fn from(err: csv::Error) -> Self {
        McmcError::Csv(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, McmcError>;
