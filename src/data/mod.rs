//! Training data ingestion and discretization.
//!
//! This module turns an external tabular dataset into the fully categorical
//! training table the estimator consumes:
//! - **dataset**: CSV loading into raw records with optional fields
//! - **discretize**: fixed binning tables and code maps, fail-closed

pub mod dataset;
pub mod discretize;

use crate::engine::network::VarId;

/// One fully observed training record: a label index for every variable in
/// the network, indexed by `VarId`.
///
/// Records are only produced by the discretizer (or tests); rows with any
/// unmapped field never become records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    labels: Vec<usize>,
}

impl TrainingRecord {
    /// Wraps a complete per-variable label index vector.
    pub fn new(labels: Vec<usize>) -> Self {
        Self { labels }
    }

    /// The observed label index for one variable.
    pub fn label_index(&self, id: VarId) -> usize {
        self.labels[id.0 as usize]
    }

    /// Number of variables covered by this record.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
