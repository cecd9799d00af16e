//! Evidence assignments and their validation.
//!
//! An [`Evidence`] value is a partial mapping from variable names to domain
//! labels, supplied at query time. Labels are validated against the closed
//! variable registry before any factor is built: unknown variable names and
//! out-of-domain labels are rejected with typed errors, never coerced.

use std::collections::btree_map;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::engine::errors::ModelError;
use crate::engine::network::{NetworkDefinition, VarId};

/// A partial assignment of observed variable values.
///
/// Stored as a `BTreeMap` so iteration (and therefore validation error
/// order) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    observations: BTreeMap<String, String>,
}

impl Evidence {
    /// An empty assignment (marginal query).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style observation; later calls override earlier ones for
    /// the same variable.
    pub fn with(mut self, variable: impl Into<String>, label: impl Into<String>) -> Self {
        self.observations.insert(variable.into(), label.into());
        self
    }

    /// Adds or replaces one observation.
    pub fn insert(&mut self, variable: impl Into<String>, label: impl Into<String>) {
        self.observations.insert(variable.into(), label.into());
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Observations in variable-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.observations.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Evidence {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut evidence = Evidence::new();
        for (variable, label) in iter {
            evidence.insert(variable, label);
        }
        evidence
    }
}

/// Resolves evidence against the registry, mapping each observation to
/// `(VarId, label index)`.
///
/// Fails with [`ModelError::UnknownVariable`] or
/// [`ModelError::UnknownEvidenceLabel`]; on failure nothing has been
/// touched, so a rejected query leaves the network untouched.
pub(crate) fn resolve_evidence(
    definition: &NetworkDefinition,
    evidence: &Evidence,
) -> Result<FxHashMap<VarId, usize>, ModelError> {
    let mut resolved = FxHashMap::default();
    for (name, label) in evidence.iter() {
        let id = definition
            .var_id(name)
            .ok_or_else(|| ModelError::UnknownVariable { name: name.clone() })?;
        let index = definition.variable(id).label_index(label).ok_or_else(|| {
            ModelError::UnknownEvidenceLabel {
                variable: name.clone(),
                label: label.clone(),
            }
        })?;
        resolved.insert(id, index);
    }
    Ok(resolved)
}
