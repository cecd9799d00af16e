//! BDeu parameter estimation.
//!
//! Learns one CPT per variable from a fully categorical training table
//! using Bayesian estimation with an equivalent-sample-size (BDeu) Dirichlet
//! prior. For child X with domain size `r` and `q` joint parent
//! configurations, every cell receives a pseudo-count of `α / (r·q)` and
//! each row normalizes by `count(pa) + α / q`:
//!
//! ```text
//! P(x | pa) = (count(x, pa) + α/(r·q)) / (count(pa) + α/q)
//! ```
//!
//! Rows always sum to exactly 1, and a parent configuration never seen in
//! the data yields the uniform distribution instead of an undefined or
//! zero-probability row. The categorical cross-product of parents is
//! sparsely populated by small clinical datasets, so this floor carries
//! real weight for wide parent sets.

use std::sync::Arc;

use crate::data::TrainingRecord;
use crate::engine::cpt::{ConditionalProbabilityTable, TrainedNetwork};
use crate::engine::errors::ModelError;
use crate::engine::network::{NetworkDefinition, VarId};

/// Equivalent sample size of the reference configuration.
pub const DEFAULT_EQUIVALENT_SAMPLE_SIZE: f64 = 10.0;

/// Estimates one CPT per variable and assembles the trained network.
///
/// The training table must be non-empty (`EmptyDatasetAfterCleaning`
/// otherwise) and the prior strength must be finite and positive.
pub fn fit(
    definition: &Arc<NetworkDefinition>,
    records: &[TrainingRecord],
    equivalent_sample_size: f64,
) -> Result<TrainedNetwork, ModelError> {
    if records.is_empty() {
        return Err(ModelError::EmptyDatasetAfterCleaning);
    }
    if !equivalent_sample_size.is_finite() || equivalent_sample_size <= 0.0 {
        return Err(ModelError::Numerical(format!(
            "equivalent sample size must be finite and > 0, got {}",
            equivalent_sample_size
        )));
    }

    let mut cpts = Vec::with_capacity(definition.variable_count());
    for idx in 0..definition.variable_count() {
        let child = VarId(idx as u16);
        cpts.push(estimate_cpt(
            definition,
            child,
            records,
            equivalent_sample_size,
        )?);
    }

    log::info!(
        "fitted {} cpts from {} records (equivalent sample size {})",
        cpts.len(),
        records.len(),
        equivalent_sample_size
    );

    TrainedNetwork::from_parts(Arc::clone(definition), cpts)
}

fn estimate_cpt(
    definition: &NetworkDefinition,
    child: VarId,
    records: &[TrainingRecord],
    alpha: f64,
) -> Result<ConditionalProbabilityTable, ModelError> {
    let parents = definition.parents(child);
    let parent_cards: Vec<usize> = parents.iter().map(|p| definition.cardinality(*p)).collect();
    let child_card = definition.cardinality(child);
    let config_count: usize = parent_cards.iter().product();

    // Mixed-radix strides over the parents, last parent fastest; must match
    // the CPT row layout.
    let mut strides = vec![0usize; parents.len()];
    let mut stride = 1usize;
    for i in (0..parents.len()).rev() {
        strides[i] = stride;
        stride *= parent_cards[i];
    }

    let mut cell_counts = vec![0.0f64; config_count * child_card];
    let mut config_counts = vec![0.0f64; config_count];
    for record in records {
        let config: usize = parents
            .iter()
            .zip(&strides)
            .map(|(parent, stride)| record.label_index(*parent) * stride)
            .sum();
        cell_counts[config * child_card + record.label_index(child)] += 1.0;
        config_counts[config] += 1.0;
    }

    let cell_prior = alpha / (child_card as f64 * config_count as f64);
    let row_prior = alpha / config_count as f64;

    let mut values = Vec::with_capacity(cell_counts.len());
    for config in 0..config_count {
        let denominator = config_counts[config] + row_prior;
        for label in 0..child_card {
            values.push((cell_counts[config * child_card + label] + cell_prior) / denominator);
        }
    }

    ConditionalProbabilityTable::new(definition, child, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::network::VariableDef;

    fn assert_close(actual: f64, expected: f64, label: &str) {
        assert!(
            (actual - expected).abs() <= 1e-12,
            "{} mismatch: expected {:.15}, got {:.15}",
            label,
            expected,
            actual
        );
    }

    fn chain_definition() -> Arc<NetworkDefinition> {
        let vars = vec![
            VariableDef::new("A", &["a0", "a1"]),
            VariableDef::new("B", &["b0", "b1"]),
        ];
        Arc::new(NetworkDefinition::new(vars, &[("A", "B")]).expect("valid definition"))
    }

    #[test]
    fn bdeu_matches_closed_form_on_chain() {
        // Records over (A, B): (a0,b0), (a0,b1), (a1,b0), alpha = 1.
        //
        // A (root, r=2, q=1): P(a0) = (2 + 0.5) / (3 + 1) = 0.625
        // B|A (r=2, q=2): cell prior 0.25, row prior 0.5
        //   P(b0|a0) = (1 + 0.25) / (2 + 0.5) = 0.5
        //   P(b0|a1) = (1 + 0.25) / (1 + 0.5) = 0.8333...
        let def = chain_definition();
        let records = vec![
            TrainingRecord::new(vec![0, 0]),
            TrainingRecord::new(vec![0, 1]),
            TrainingRecord::new(vec![1, 0]),
        ];
        let network = fit(&def, &records, 1.0).expect("fit");

        let a = def.var_id("A").expect("A");
        let b = def.var_id("B").expect("B");
        assert_close(network.cpt(a).row(0)[0], 0.625, "P(a0)");
        assert_close(network.cpt(a).row(0)[1], 0.375, "P(a1)");
        assert_close(network.cpt(b).row(0)[0], 0.5, "P(b0|a0)");
        assert_close(network.cpt(b).row(0)[1], 0.5, "P(b1|a0)");
        assert_close(network.cpt(b).row(1)[0], 1.25 / 1.5, "P(b0|a1)");
        assert_close(network.cpt(b).row(1)[1], 0.25 / 1.5, "P(b1|a1)");
    }

    #[test]
    fn unseen_parent_configuration_yields_uniform_row() {
        let def = chain_definition();
        // A never takes a1, so the a1 row of B|A has zero counts.
        let records = vec![
            TrainingRecord::new(vec![0, 0]),
            TrainingRecord::new(vec![0, 0]),
            TrainingRecord::new(vec![0, 1]),
        ];
        let network = fit(&def, &records, 10.0).expect("fit");

        let b = def.var_id("B").expect("B");
        assert_close(network.cpt(b).row(1)[0], 0.5, "P(b0|a1) uniform");
        assert_close(network.cpt(b).row(1)[1], 0.5, "P(b1|a1) uniform");
    }

    #[test]
    fn every_row_sums_to_one() {
        let def = chain_definition();
        let records = vec![
            TrainingRecord::new(vec![0, 0]),
            TrainingRecord::new(vec![1, 1]),
            TrainingRecord::new(vec![1, 0]),
        ];
        let network = fit(&def, &records, 10.0).expect("fit");
        for cpt in network.cpts() {
            for config in 0..cpt.config_count() {
                let sum: f64 = cpt.row(config).iter().sum();
                assert!((sum - 1.0).abs() <= 1e-9, "row sum {} off", sum);
            }
        }
    }

    #[test]
    fn empty_table_is_rejected_before_estimation() {
        let def = chain_definition();
        let err = fit(&def, &[], 10.0).expect_err("empty table must be rejected");
        assert!(matches!(err, ModelError::EmptyDatasetAfterCleaning));
    }

    #[test]
    fn non_positive_prior_strength_is_rejected() {
        let def = chain_definition();
        let records = vec![TrainingRecord::new(vec![0, 0])];
        let err = fit(&def, &records, 0.0).expect_err("zero alpha must be rejected");
        assert!(matches!(err, ModelError::Numerical(_)));
    }
}
