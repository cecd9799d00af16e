//! Conditional probability tables and the trained network container.
//!
//! A [`ConditionalProbabilityTable`] stores `P(child | parent configuration)`
//! as a dense row-major table: one row per joint parent assignment, one
//! column per child label. Parent configurations are indexed mixed-radix in
//! stored parent order with the last parent varying fastest.
//!
//! A [`TrainedNetwork`] couples the network definition with one CPT per
//! variable. It is immutable once constructed and safe to share across
//! unlimited concurrent read-only queries.

use std::sync::Arc;

use crate::engine::errors::ModelError;
use crate::engine::network::{NetworkDefinition, VarId};

/// Tolerance for the per-row sum-to-one invariant.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// A dense conditional probability table for one variable.
#[derive(Debug, Clone)]
pub struct ConditionalProbabilityTable {
    child: VarId,
    parents: Vec<VarId>,
    parent_cards: Vec<usize>,
    child_card: usize,
    /// Row-major values: `values[config * child_card + child_label]`.
    values: Vec<f64>,
}

impl ConditionalProbabilityTable {
    /// Creates a table from raw values, checking shape and row invariants.
    pub fn new(
        definition: &NetworkDefinition,
        child: VarId,
        values: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let parents: Vec<VarId> = definition.parents(child).to_vec();
        let parent_cards: Vec<usize> = parents
            .iter()
            .map(|p| definition.cardinality(*p))
            .collect();
        let child_card = definition.cardinality(child);
        let config_count: usize = parent_cards.iter().product();

        if values.len() != config_count * child_card {
            return Err(ModelError::Numerical(format!(
                "cpt for '{}' has {} values, expected {}",
                definition.variable(child).name(),
                values.len(),
                config_count * child_card
            )));
        }

        let table = Self {
            child,
            parents,
            parent_cards,
            child_card,
            values,
        };
        table.validate_rows(definition)?;
        Ok(table)
    }

    /// The child variable this table is conditioned on.
    pub fn child(&self) -> VarId {
        self.child
    }

    /// Parent variables in stored (edge declaration) order.
    pub fn parents(&self) -> &[VarId] {
        &self.parents
    }

    /// Cardinalities of the parents, aligned with [`Self::parents`].
    pub fn parent_cards(&self) -> &[usize] {
        &self.parent_cards
    }

    /// Cardinality of the child domain.
    pub fn child_cardinality(&self) -> usize {
        self.child_card
    }

    /// Number of joint parent configurations (1 for root variables).
    pub fn config_count(&self) -> usize {
        self.parent_cards.iter().product()
    }

    /// The distribution row for one parent configuration.
    pub fn row(&self, config: usize) -> &[f64] {
        &self.values[config * self.child_card..(config + 1) * self.child_card]
    }

    /// All values, row-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mixed-radix strides over the parents, last parent fastest.
    pub fn parent_strides(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.parents.len()];
        let mut stride = 1usize;
        for i in (0..self.parents.len()).rev() {
            strides[i] = stride;
            stride *= self.parent_cards[i];
        }
        strides
    }

    /// Checks that every row is a probability distribution: non-negative,
    /// finite, and summing to 1 within [`ROW_SUM_TOLERANCE`].
    pub fn validate_rows(&self, definition: &NetworkDefinition) -> Result<(), ModelError> {
        let name = definition.variable(self.child).name();
        for config in 0..self.config_count() {
            let row = self.row(config);
            let mut sum = 0.0;
            for &v in row {
                if !v.is_finite() || v < 0.0 {
                    return Err(ModelError::Numerical(format!(
                        "cpt for '{}' has invalid probability {} in row {}",
                        name, v, config
                    )));
                }
                sum += v;
            }
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ModelError::Numerical(format!(
                    "cpt row {} for '{}' sums to {} (expected 1)",
                    config, name, sum
                )));
            }
        }
        Ok(())
    }
}

/// A fully parameterized network: definition plus one CPT per variable.
///
/// Immutable after construction. Retraining produces a new value; nothing
/// referenced by in-flight queries is ever mutated.
#[derive(Debug, Clone)]
pub struct TrainedNetwork {
    definition: Arc<NetworkDefinition>,
    /// One table per variable, indexed by `VarId`.
    cpts: Vec<ConditionalProbabilityTable>,
}

impl TrainedNetwork {
    /// Assembles a trained network, checking that every variable has a
    /// table and that every table satisfies its row invariants.
    pub fn from_parts(
        definition: Arc<NetworkDefinition>,
        cpts: Vec<ConditionalProbabilityTable>,
    ) -> Result<Self, ModelError> {
        if cpts.len() != definition.variable_count() {
            return Err(ModelError::Numerical(format!(
                "expected {} cpts, got {}",
                definition.variable_count(),
                cpts.len()
            )));
        }
        for (idx, cpt) in cpts.iter().enumerate() {
            if cpt.child() != VarId(idx as u16) {
                return Err(ModelError::Numerical(format!(
                    "cpt at position {} is for variable {:?}",
                    idx,
                    cpt.child()
                )));
            }
            cpt.validate_rows(&definition)?;
        }
        Ok(Self { definition, cpts })
    }

    /// The network structure this model was trained on.
    pub fn definition(&self) -> &Arc<NetworkDefinition> {
        &self.definition
    }

    /// The table for one variable.
    pub fn cpt(&self, id: VarId) -> &ConditionalProbabilityTable {
        &self.cpts[id.0 as usize]
    }

    /// All tables, indexed by `VarId`.
    pub fn cpts(&self) -> &[ConditionalProbabilityTable] {
        &self.cpts
    }
}
