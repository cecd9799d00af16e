//! # Cardiograph
//!
//! A discrete Bayesian-network engine for cardiovascular-disease risk
//! estimation: raw clinical measurements are discretized into categorical
//! evidence, conditional probability tables are learned with a BDeu
//! Dirichlet prior over a fixed causal graph, and marginal/conditional risk
//! queries are answered by exact variable elimination.
//!
//! ## Architecture
//!
//! - **data**: CSV ingestion and fail-closed discretization into the
//!   categorical training table
//! - **engine**: the probabilistic core: network definition, parameter
//!   estimation, factor algebra, inference, and diagnostics
//! - **risk**: post-hoc treatment multipliers and risk categorization,
//!   deliberately outside the probabilistic core
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cardiograph::{train_from_path, Evidence};
//!
//! let model = train_from_path("heart_disease_dataset.csv")?;
//! let evidence = Evidence::new()
//!     .with("Age", "Old")
//!     .with("BloodPressure", "High");
//! let risk = model.network.positive_probability(&evidence)?;
//! let report = model.verify()?;
//! ```
//!
//! Training runs once at startup; the resulting [`TrainedNetwork`] is
//! immutable and safe for unlimited concurrent read-only queries. Use
//! [`ModelSlot`] to distinguish "not trained yet" from "ready" and to swap
//! in a retrained snapshot atomically.

#![forbid(unsafe_code)]

pub mod data;
pub mod engine;
pub mod risk;

use std::path::Path;
use std::sync::Arc;

// Re-export commonly used types
pub use data::dataset::{load_records, RawRecord};
pub use data::discretize::Discretizer;
pub use data::TrainingRecord;
pub use engine::cpt::{ConditionalProbabilityTable, TrainedNetwork};
pub use engine::errors::ModelError;
pub use engine::estimator::{fit, DEFAULT_EQUIVALENT_SAMPLE_SIZE};
pub use engine::evidence::Evidence;
pub use engine::inference::{EliminationStrategy, ModelSlot, Posterior};
pub use engine::network::{cardio_network, NetworkDefinition, VarId, VariableDef};
pub use engine::verify::{
    verify, CalibrationReport, ClinicalScenarioReport, ExplainingAwayReport,
    ExplainingAwayVerdict, VerificationReport,
};

/// A trained model bundled with the retained training table the verifier
/// consumes.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// The immutable trained network, ready for concurrent queries.
    pub network: Arc<TrainedNetwork>,
    /// The cleaned categorical table the network was fitted on.
    pub training_table: Vec<TrainingRecord>,
}

impl TrainedModel {
    /// Runs the model diagnostics against the retained table.
    pub fn verify(&self) -> Result<VerificationReport, ModelError> {
        engine::verify::verify(&self.network, &self.training_table)
    }
}

/// One-call startup pipeline: load the dataset, discretize and clean it,
/// and fit the cardiovascular network with the reference prior strength.
pub fn train_from_path(path: impl AsRef<Path>) -> Result<TrainedModel, ModelError> {
    let definition = Arc::new(cardio_network()?);
    let rows = load_records(path)?;
    let discretizer = Discretizer::new(Arc::clone(&definition))?;
    let table = discretizer.clean_table(&rows)?;
    let network = fit(&definition, &table, DEFAULT_EQUIVALENT_SAMPLE_SIZE)?;
    Ok(TrainedModel {
        network: Arc::new(network),
        training_table: table,
    })
}
