//! The Bayesian-network engine.
//!
//! This module provides:
//! - **errors**: Error types for construction, training, and query failures
//! - **network**: Variables, domains, and the fixed causal DAG
//! - **cpt**: Conditional probability tables and the trained network
//! - **estimator**: BDeu parameter estimation
//! - **evidence**: Evidence assignments and validation
//! - **inference**: Exact queries by variable elimination
//! - **verify**: Read-only model diagnostics

pub mod cpt;
pub mod errors;
pub mod estimator;
pub mod evidence;
pub(crate) mod factor;
pub mod inference;
pub mod network;
pub mod verify;
