//! Exact inference by variable elimination.
//!
//! Queries against a [`TrainedNetwork`] follow the classic scheme:
//!
//! 1. Validate every evidence label against the variable registry.
//! 2. Instantiate one factor per CPT, restricted to evidence-consistent
//!    rows (evidence axes are sliced out of the factor scopes).
//! 3. Repeatedly pick a non-query, non-evidence variable, multiply all
//!    factors mentioning it, sum it out, and replace the consumed factors
//!    with the product.
//! 4. Multiply the survivors into one joint factor over the query
//!    variables and normalize.
//!
//! The elimination order affects only intermediate factor sizes, never the
//! returned distribution (beyond floating-point rounding). The default
//! order is a greedy min-weight heuristic with ties broken by `VarId`, so
//! repeated queries are fully deterministic;
//! [`EliminationStrategy::ReverseTopological`] forces a different fixed
//! order and exists to exercise order independence in tests.
//!
//! Each query builds and discards its own factors. Nothing on the query
//! path mutates shared state, so a `TrainedNetwork` (or an `Arc` of one)
//! may serve unlimited concurrent callers.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::engine::cpt::TrainedNetwork;
use crate::engine::errors::ModelError;
use crate::engine::evidence::{resolve_evidence, Evidence};
use crate::engine::factor::Factor;
use crate::engine::network::VarId;

/// Strategy for ordering the eliminated variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EliminationStrategy {
    /// Greedy: at each step eliminate the variable whose resulting factor
    /// is smallest; ties broken by `VarId`. Deterministic.
    #[default]
    MinWeight,
    /// Eliminate in reverse topological order of the network. Usually
    /// slower; the returned distribution is identical within tolerance.
    ReverseTopological,
}

/// A normalized probability distribution over the joint domain of the
/// query variables, in the order they were requested.
#[derive(Debug, Clone)]
pub struct Posterior {
    variables: Vec<String>,
    labels: Vec<Vec<String>>,
    /// Row-major over the requested variable order, last axis fastest.
    values: Vec<f64>,
}

impl Posterior {
    /// Query variable names, in requested order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Domain labels of one query variable.
    pub fn labels(&self, variable_index: usize) -> &[String] {
        &self.labels[variable_index]
    }

    /// The normalized joint probabilities, row-major over the requested
    /// variable order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Probability of one full joint assignment, given as one label per
    /// query variable in requested order.
    pub fn probability(&self, assignment: &[&str]) -> Option<f64> {
        if assignment.len() != self.variables.len() {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for axis in (0..self.variables.len()).rev() {
            let index = self.labels[axis]
                .iter()
                .position(|l| l == assignment[axis])?;
            offset += index * stride;
            stride *= self.labels[axis].len();
        }
        Some(self.values[offset])
    }

    /// Marginal probability of `variable = label` within this posterior,
    /// summing over the other query variables.
    pub fn probability_of(&self, variable: &str, label: &str) -> Option<f64> {
        let axis = self.variables.iter().position(|v| v == variable)?;
        let index = self.labels[axis].iter().position(|l| l == label)?;

        let mut stride = 1usize;
        for later in (axis + 1)..self.variables.len() {
            stride *= self.labels[later].len();
        }
        let card = self.labels[axis].len();

        let mut sum = 0.0;
        for (pos, value) in self.values.iter().enumerate() {
            if (pos / stride) % card == index {
                sum += value;
            }
        }
        Some(sum)
    }
}

impl TrainedNetwork {
    /// Answers a marginal/conditional query with the default elimination
    /// strategy.
    pub fn query(&self, targets: &[&str], evidence: &Evidence) -> Result<Posterior, ModelError> {
        self.query_with_strategy(targets, evidence, EliminationStrategy::MinWeight)
    }

    /// Answers a query with an explicit elimination strategy.
    pub fn query_with_strategy(
        &self,
        targets: &[&str],
        evidence: &Evidence,
        strategy: EliminationStrategy,
    ) -> Result<Posterior, ModelError> {
        let definition = self.definition();

        if targets.is_empty() {
            return Err(ModelError::InferenceFailure(
                "query requires at least one target variable".into(),
            ));
        }
        let mut target_ids = Vec::with_capacity(targets.len());
        for name in targets {
            let id = definition
                .var_id(name)
                .ok_or_else(|| ModelError::UnknownVariable {
                    name: (*name).to_string(),
                })?;
            if target_ids.contains(&id) {
                return Err(ModelError::InferenceFailure(format!(
                    "duplicate target variable '{}'",
                    name
                )));
            }
            target_ids.push(id);
        }

        let observed = resolve_evidence(definition, evidence)?;
        for (name, id) in targets.iter().zip(&target_ids) {
            if observed.contains_key(id) {
                return Err(ModelError::InferenceFailure(format!(
                    "target variable '{}' is also evidence",
                    name
                )));
            }
        }

        let mut factors: Vec<Factor> = self
            .cpts()
            .iter()
            .map(|cpt| Factor::from_cpt(cpt, &observed))
            .collect();

        let mut to_eliminate: Vec<VarId> = (0..definition.variable_count())
            .map(|idx| VarId(idx as u16))
            .filter(|id| !target_ids.contains(id) && !observed.contains_key(id))
            .collect();

        match strategy {
            EliminationStrategy::MinWeight => {
                while !to_eliminate.is_empty() {
                    let next = pick_min_weight(&to_eliminate, &factors);
                    to_eliminate.retain(|id| *id != next);
                    eliminate(&mut factors, next);
                }
            }
            EliminationStrategy::ReverseTopological => {
                let order: Vec<VarId> = definition
                    .topological_order()
                    .iter()
                    .rev()
                    .copied()
                    .filter(|id| to_eliminate.contains(id))
                    .collect();
                for var in order {
                    eliminate(&mut factors, var);
                }
            }
        }

        let mut joint = Factor::scalar(1.0);
        for factor in &factors {
            joint = joint.product(factor);
        }

        let total = joint.total();
        if !total.is_finite() {
            return Err(ModelError::Numerical(format!(
                "joint mass is not finite: {}",
                total
            )));
        }
        if total <= 0.0 {
            return Err(ModelError::NormalizationFailure);
        }

        Ok(build_posterior(self, &target_ids, &joint, total))
    }

    /// Probability of `Disease = Positive` under the given evidence, the
    /// primary external query.
    pub fn positive_probability(&self, evidence: &Evidence) -> Result<f64, ModelError> {
        let posterior = self.query(&["Disease"], evidence)?;
        posterior
            .probability_of("Disease", "Positive")
            .ok_or_else(|| {
                ModelError::Numerical("posterior is missing the Positive label".into())
            })
    }
}

/// Weight of the factor produced by eliminating `candidate`: the product
/// of the cardinalities of every other variable sharing a factor with it.
fn elimination_weight(candidate: VarId, factors: &[Factor]) -> usize {
    let mut weight = 1usize;
    let mut counted: Vec<VarId> = Vec::new();
    for factor in factors {
        if !factor.mentions(candidate) {
            continue;
        }
        for (var, card) in factor.scope().iter().zip(factor.cards()) {
            if *var != candidate && !counted.contains(var) {
                counted.push(*var);
                weight = weight.saturating_mul(*card);
            }
        }
    }
    weight
}

fn pick_min_weight(candidates: &[VarId], factors: &[Factor]) -> VarId {
    let mut best = candidates[0];
    let mut best_weight = usize::MAX;
    for candidate in candidates {
        let weight = elimination_weight(*candidate, factors);
        if weight < best_weight || (weight == best_weight && *candidate < best) {
            best = *candidate;
            best_weight = weight;
        }
    }
    best
}

/// Multiplies all factors mentioning `var`, sums it out, and replaces the
/// consumed factors with the product.
fn eliminate(factors: &mut Vec<Factor>, var: VarId) {
    let (mentioning, rest): (Vec<Factor>, Vec<Factor>) =
        std::mem::take(factors).into_iter().partition(|f| f.mentions(var));
    *factors = rest;

    let mut product: Option<Factor> = None;
    for factor in mentioning {
        product = Some(match product {
            Some(acc) => acc.product(&factor),
            None => factor,
        });
    }
    if let Some(product) = product {
        factors.push(product.sum_out(var));
    }
}

fn build_posterior(
    network: &TrainedNetwork,
    target_ids: &[VarId],
    joint: &Factor,
    total: f64,
) -> Posterior {
    let definition = network.definition();
    let variables: Vec<String> = target_ids
        .iter()
        .map(|id| definition.variable(*id).name().to_string())
        .collect();
    let labels: Vec<Vec<String>> = target_ids
        .iter()
        .map(|id| definition.variable(*id).labels().to_vec())
        .collect();
    let cards: Vec<usize> = labels.iter().map(|l| l.len()).collect();

    // Joint factor axes are sorted by VarId; re-walk them in the requested
    // target order.
    let mut scope_strides: FxHashMap<VarId, usize> = FxHashMap::default();
    {
        let mut stride = 1usize;
        for axis in (0..joint.scope().len()).rev() {
            scope_strides.insert(joint.scope()[axis], stride);
            stride *= joint.cards()[axis];
        }
    }
    let strides: Vec<usize> = target_ids
        .iter()
        .map(|id| scope_strides.get(id).copied().unwrap_or(0))
        .collect();

    let len: usize = cards.iter().product();
    let mut values = Vec::with_capacity(len);
    let mut idx = vec![0usize; cards.len()];
    let mut offset = 0usize;
    for step in 0..len {
        values.push(joint.values()[offset] / total);
        if step + 1 == len {
            break;
        }
        for axis in (0..cards.len()).rev() {
            idx[axis] += 1;
            offset += strides[axis];
            if idx[axis] < cards[axis] {
                break;
            }
            idx[axis] = 0;
            offset -= strides[axis] * cards[axis];
        }
    }

    Posterior {
        variables,
        labels,
        values,
    }
}

/// Holder distinguishing "not trained yet" from "ready", with atomic
/// snapshot publication.
///
/// The slot never hands out mutable access: training (or retraining)
/// produces a fresh immutable [`TrainedNetwork`] and [`ModelSlot::publish`]
/// swaps it in; queries already running against the previous snapshot keep
/// their `Arc` and are unaffected.
#[derive(Debug, Default)]
pub struct ModelSlot {
    current: RwLock<Option<Arc<TrainedNetwork>>>,
}

impl ModelSlot {
    /// An empty (untrained) slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a trained network has been published.
    pub fn is_ready(&self) -> bool {
        match self.current.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    /// Publishes a new snapshot, replacing any previous one.
    pub fn publish(&self, network: Arc<TrainedNetwork>) {
        match self.current.write() {
            Ok(mut guard) => *guard = Some(network),
            Err(poisoned) => *poisoned.into_inner() = Some(network),
        }
    }

    /// The current snapshot, or `InferenceFailure` when not trained.
    pub fn snapshot(&self) -> Result<Arc<TrainedNetwork>, ModelError> {
        let guard = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| ModelError::InferenceFailure("model is not trained yet".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cpt::ConditionalProbabilityTable;
    use crate::engine::network::{NetworkDefinition, VariableDef};

    /// A -> B with P(a0)=0.625 and P(b0|a0)=0.5, P(b0|a1)=5/6.
    fn chain_network() -> TrainedNetwork {
        let vars = vec![
            VariableDef::new("A", &["a0", "a1"]),
            VariableDef::new("B", &["b0", "b1"]),
        ];
        let def =
            Arc::new(NetworkDefinition::new(vars, &[("A", "B")]).expect("valid definition"));
        let a = def.var_id("A").expect("A");
        let b = def.var_id("B").expect("B");
        let cpt_a =
            ConditionalProbabilityTable::new(&def, a, vec![0.625, 0.375]).expect("cpt A");
        let cpt_b = ConditionalProbabilityTable::new(
            &def,
            b,
            vec![0.5, 0.5, 5.0 / 6.0, 1.0 / 6.0],
        )
        .expect("cpt B");
        TrainedNetwork::from_parts(def, vec![cpt_a, cpt_b]).expect("network")
    }

    #[test]
    fn marginal_query_sums_out_hidden_variables() {
        let network = chain_network();
        let posterior = network
            .query(&["B"], &Evidence::new())
            .expect("marginal query");

        // P(b0) = 0.625*0.5 + 0.375*5/6 = 0.625
        let p_b0 = posterior.probability_of("B", "b0").expect("b0");
        assert!((p_b0 - 0.625).abs() < 1e-12);
        let sum: f64 = posterior.values().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn conditional_query_applies_bayes_rule() {
        let network = chain_network();
        let evidence = Evidence::new().with("B", "b1");
        let posterior = network.query(&["A"], &evidence).expect("conditional query");

        // P(a0|b1) = 0.625*0.5 / (0.625*0.5 + 0.375*1/6) = 5/6
        let p_a0 = posterior.probability_of("A", "a0").expect("a0");
        assert!((p_a0 - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn joint_query_returns_requested_axis_order() {
        let network = chain_network();
        let forward = network.query(&["A", "B"], &Evidence::new()).expect("joint");
        let backward = network.query(&["B", "A"], &Evidence::new()).expect("joint");

        let p = forward.probability(&["a1", "b0"]).expect("assignment");
        let q = backward.probability(&["b0", "a1"]).expect("assignment");
        assert!((p - q).abs() < 1e-12);
        assert!((p - 0.375 * 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn strategies_agree_on_the_distribution() {
        let network = chain_network();
        let evidence = Evidence::new().with("B", "b0");
        let greedy = network
            .query_with_strategy(&["A"], &evidence, EliminationStrategy::MinWeight)
            .expect("greedy");
        let fixed = network
            .query_with_strategy(&["A"], &evidence, EliminationStrategy::ReverseTopological)
            .expect("fixed");
        for (g, f) in greedy.values().iter().zip(fixed.values()) {
            assert!((g - f).abs() < 1e-12);
        }
    }

    #[test]
    fn target_overlapping_evidence_is_rejected() {
        let network = chain_network();
        let evidence = Evidence::new().with("B", "b0");
        let err = network
            .query(&["B"], &evidence)
            .expect_err("target-as-evidence must be rejected");
        assert!(matches!(err, ModelError::InferenceFailure(_)));
    }

    #[test]
    fn empty_target_list_is_rejected() {
        let network = chain_network();
        let err = network
            .query(&[], &Evidence::new())
            .expect_err("empty target list must be rejected");
        assert!(matches!(err, ModelError::InferenceFailure(_)));
    }

    #[test]
    fn contradictory_evidence_fails_normalization() {
        // P(a1) = 0: evidence on a1 excludes all mass.
        let vars = vec![
            VariableDef::new("A", &["a0", "a1"]),
            VariableDef::new("B", &["b0", "b1"]),
        ];
        let def =
            Arc::new(NetworkDefinition::new(vars, &[("A", "B")]).expect("valid definition"));
        let a = def.var_id("A").expect("A");
        let b = def.var_id("B").expect("B");
        let cpt_a = ConditionalProbabilityTable::new(&def, a, vec![1.0, 0.0]).expect("cpt A");
        let cpt_b = ConditionalProbabilityTable::new(&def, b, vec![0.5, 0.5, 0.5, 0.5])
            .expect("cpt B");
        let network = TrainedNetwork::from_parts(def, vec![cpt_a, cpt_b]).expect("network");

        let evidence = Evidence::new().with("A", "a1");
        let err = network
            .query(&["B"], &evidence)
            .expect_err("zero mass must be detected");
        assert!(matches!(err, ModelError::NormalizationFailure));
    }

    #[test]
    fn rejected_query_leaves_network_usable() {
        let network = chain_network();
        let bad = Evidence::new().with("A", "zz");
        assert!(network.query(&["B"], &bad).is_err());

        let posterior = network
            .query(&["B"], &Evidence::new())
            .expect("network still serves queries");
        assert!((posterior.values().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn model_slot_reports_readiness() {
        let slot = ModelSlot::new();
        assert!(!slot.is_ready());
        let err = slot.snapshot().expect_err("untrained slot must fail");
        assert!(matches!(err, ModelError::InferenceFailure(_)));

        slot.publish(Arc::new(chain_network()));
        assert!(slot.is_ready());
        let snapshot = slot.snapshot().expect("ready slot");
        assert!(snapshot.query(&["B"], &Evidence::new()).is_ok());
    }

    #[test]
    fn published_snapshot_survives_replacement() {
        let slot = ModelSlot::new();
        slot.publish(Arc::new(chain_network()));
        let held = slot.snapshot().expect("first snapshot");

        slot.publish(Arc::new(chain_network()));
        // The held snapshot still answers queries after the swap.
        assert!(held.query(&["A"], &Evidence::new()).is_ok());
    }
}
