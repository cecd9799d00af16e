//! Error types for network construction, training, and queries.

use thiserror::Error;

/// Errors that can occur while building, training, or querying the model.
///
/// Startup failures (`DatasetNotFound`, `DatasetFormat`,
/// `EmptyDatasetAfterCleaning`) and construction failures
/// (`GraphAcyclicityViolation`, `InvalidGraph`) leave the service not ready.
/// Query failures (`UnknownVariable`, `UnknownEvidenceLabel`,
/// `InferenceFailure`, `NormalizationFailure`) are local to one request and
/// never invalidate the shared trained network.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// The training dataset file does not exist.
    #[error("dataset not found: {path}")]
    DatasetNotFound { path: String },

    /// The training dataset exists but cannot be read as the expected table.
    #[error("dataset format error: {0}")]
    DatasetFormat(String),

    /// Discretization and filtering removed every training record.
    #[error("dataset is empty after cleaning; no records left to train on")]
    EmptyDatasetAfterCleaning,

    /// The declared edge set contains a directed cycle.
    #[error("graph acyclicity violation: {0}")]
    GraphAcyclicityViolation(String),

    /// The graph description is malformed (unknown endpoints, duplicate
    /// names, empty domains).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Evidence references a variable that is not declared in the network.
    #[error("unknown variable '{name}' in evidence")]
    UnknownVariable { name: String },

    /// Evidence assigns a label outside the variable's domain.
    #[error("unknown evidence label '{label}' for variable '{variable}'")]
    UnknownEvidenceLabel { variable: String, label: String },

    /// A query was issued against a model that is not trained yet.
    #[error("inference failure: {0}")]
    InferenceFailure(String),

    /// The unnormalized joint over the query variables summed to zero;
    /// the evidence combination excludes all probability mass.
    #[error("normalization failure: evidence is contradictory, joint mass is zero")]
    NormalizationFailure,

    /// A numeric invariant was violated (non-finite value, row sum off).
    #[error("numerical error: {0}")]
    Numerical(String),
}
