//! Network definition: categorical variables and the fixed causal DAG.
//!
//! A [`NetworkDefinition`] is a data-driven description of the model
//! structure: a set of named categorical variables (each with a finite,
//! ordered domain) and a set of directed parent→child edges. The structure
//! is externally authored and fixed; it is validated once at construction
//! for referential integrity and acyclicity, and never mutated afterwards.
//!
//! [`cardio_network`] builds the 14-variable, 20-edge cardiovascular graph
//! used by the risk model.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::engine::errors::ModelError;

/// A unique identifier for a variable in the network.
///
/// VarId implements Ord/PartialOrd for stable, deterministic iteration.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct VarId(pub u16);

/// A named categorical variable with a finite ordered domain.
///
/// Immutable once defined; label order is significant and determines the
/// index layout of CPT rows and factor axes.
#[derive(Debug, Clone, Serialize)]
pub struct VariableDef {
    name: String,
    labels: Vec<String>,
}

impl VariableDef {
    /// Creates a variable definition from a name and ordered domain labels.
    pub fn new(name: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            name: name.into(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
        }
    }

    /// The variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered domain labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels in the domain.
    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }

    /// Index of a label within the domain, if it belongs to it.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// An immutable directed acyclic graph over named categorical variables.
///
/// Construction validates:
/// - variable names are unique and domains are non-empty with unique labels
/// - every edge endpoint is a declared variable
/// - no self-edges and no duplicate edges
/// - the edge set is acyclic (checked with Kahn's algorithm)
///
/// Violations are construction-time errors, not runtime query errors: the
/// graph is fixed at build time, not learned.
#[derive(Debug, Clone)]
pub struct NetworkDefinition {
    variables: Vec<VariableDef>,
    edges: Vec<(VarId, VarId)>,
    parents: Vec<Vec<VarId>>,
    name_index: FxHashMap<String, VarId>,
    topo_order: Vec<VarId>,
}

impl NetworkDefinition {
    /// Builds and validates a network definition from variables and
    /// name-addressed edges.
    pub fn new(variables: Vec<VariableDef>, edges: &[(&str, &str)]) -> Result<Self, ModelError> {
        let mut name_index: FxHashMap<String, VarId> = FxHashMap::default();
        for (idx, var) in variables.iter().enumerate() {
            if var.labels.is_empty() {
                return Err(ModelError::InvalidGraph(format!(
                    "variable '{}' has an empty domain",
                    var.name
                )));
            }
            let mut seen = std::collections::HashSet::new();
            for label in &var.labels {
                if !seen.insert(label.as_str()) {
                    return Err(ModelError::InvalidGraph(format!(
                        "variable '{}' declares duplicate label '{}'",
                        var.name, label
                    )));
                }
            }
            if name_index
                .insert(var.name.clone(), VarId(idx as u16))
                .is_some()
            {
                return Err(ModelError::InvalidGraph(format!(
                    "duplicate variable name '{}'",
                    var.name
                )));
            }
        }

        let mut edge_ids = Vec::with_capacity(edges.len());
        let mut parents: Vec<Vec<VarId>> = vec![Vec::new(); variables.len()];
        let mut seen_edges = std::collections::HashSet::new();
        for (src, dst) in edges {
            let src_id = *name_index.get(*src).ok_or_else(|| {
                ModelError::InvalidGraph(format!("edge source '{}' is not a declared variable", src))
            })?;
            let dst_id = *name_index.get(*dst).ok_or_else(|| {
                ModelError::InvalidGraph(format!("edge target '{}' is not a declared variable", dst))
            })?;
            if src_id == dst_id {
                return Err(ModelError::InvalidGraph(format!(
                    "self-edge on variable '{}'",
                    src
                )));
            }
            if !seen_edges.insert((src_id, dst_id)) {
                return Err(ModelError::InvalidGraph(format!(
                    "duplicate edge '{}' -> '{}'",
                    src, dst
                )));
            }
            edge_ids.push((src_id, dst_id));
            parents[dst_id.0 as usize].push(src_id);
        }

        let topo_order = topological_order(variables.len(), &edge_ids)?;

        Ok(Self {
            variables,
            edges: edge_ids,
            parents,
            name_index,
            topo_order,
        })
    }

    /// Number of declared variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// All variable definitions, in declaration order (`VarId` order).
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// The definition of one variable.
    pub fn variable(&self, id: VarId) -> &VariableDef {
        &self.variables[id.0 as usize]
    }

    /// Resolves a variable name to its id.
    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.name_index.get(name).copied()
    }

    /// Directed edges as (parent, child) id pairs, in declaration order.
    pub fn edges(&self) -> &[(VarId, VarId)] {
        &self.edges
    }

    /// Directed edges as (parent, child) name pairs, for introspection.
    pub fn edge_names(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .map(|(src, dst)| (self.variable(*src).name(), self.variable(*dst).name()))
            .collect()
    }

    /// Variable names in declaration order, for introspection.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name()).collect()
    }

    /// Parent set of a variable, in edge declaration order.
    pub fn parents(&self, id: VarId) -> &[VarId] {
        &self.parents[id.0 as usize]
    }

    /// A topological order of the variables (parents before children).
    pub fn topological_order(&self) -> &[VarId] {
        &self.topo_order
    }

    /// Cardinality of a variable's domain.
    pub fn cardinality(&self, id: VarId) -> usize {
        self.variable(id).cardinality()
    }
}

/// Kahn's algorithm; ties are broken by `VarId` so the order is stable.
fn topological_order(
    variable_count: usize,
    edges: &[(VarId, VarId)],
) -> Result<Vec<VarId>, ModelError> {
    let mut in_degree = vec![0usize; variable_count];
    let mut children: Vec<Vec<VarId>> = vec![Vec::new(); variable_count];
    for (src, dst) in edges {
        in_degree[dst.0 as usize] += 1;
        children[src.0 as usize].push(*dst);
    }

    let mut ready: Vec<VarId> = (0..variable_count)
        .filter(|idx| in_degree[*idx] == 0)
        .map(|idx| VarId(idx as u16))
        .collect();
    let mut order = Vec::with_capacity(variable_count);

    while let Some(next) = ready.iter().min().copied() {
        ready.retain(|id| *id != next);
        order.push(next);
        for child in &children[next.0 as usize] {
            let degree = &mut in_degree[child.0 as usize];
            *degree -= 1;
            if *degree == 0 {
                ready.push(*child);
            }
        }
    }

    if order.len() != variable_count {
        let stuck: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(idx, _)| format!("#{}", idx))
            .collect();
        return Err(ModelError::GraphAcyclicityViolation(format!(
            "cycle through variables {}",
            stuck.join(", ")
        )));
    }

    Ok(order)
}

/// Builds the fixed cardiovascular network: 14 variables, 20 edges.
///
/// Demographics drive the physiological measurements, the measurements and
/// test findings drive `Disease`, and `Disease` drives the symptom
/// variables (chest pain type, exercise-induced angina).
pub fn cardio_network() -> Result<NetworkDefinition, ModelError> {
    let variables = vec![
        VariableDef::new("Age", &["Young", "Middle", "Old"]),
        VariableDef::new("Sex", &["Female", "Male"]),
        VariableDef::new(
            "ChestPain",
            &["TypicalAngina", "AtypicalAngina", "NonAnginal", "Asymptomatic"],
        ),
        VariableDef::new("BloodPressure", &["Normal", "Elevated", "High"]),
        VariableDef::new("Cholesterol", &["Desirable", "Borderline", "High"]),
        VariableDef::new("FastingSugar", &["Normal", "High"]),
        VariableDef::new("RestingEcg", &["Normal", "StAbnormality", "Lvh"]),
        VariableDef::new("HeartRate", &["Low", "Normal", "High"]),
        VariableDef::new("ExerciseAngina", &["No", "Yes"]),
        VariableDef::new("StDepression", &["None", "Ischemia", "Severe"]),
        VariableDef::new("StSlope", &["Upsloping", "Flat", "Downsloping"]),
        VariableDef::new(
            "MajorVessels",
            &["0Vessels", "1Vessels", "2Vessels", "3Vessels"],
        ),
        VariableDef::new("Thalassemia", &["Normal", "FixedDefect", "ReversibleDefect"]),
        VariableDef::new("Disease", &["Negative", "Positive"]),
    ];

    let edges = [
        ("Sex", "BloodPressure"),
        ("Sex", "Cholesterol"),
        ("Age", "BloodPressure"),
        ("Age", "Cholesterol"),
        ("Age", "HeartRate"),
        ("Age", "MajorVessels"),
        ("Cholesterol", "MajorVessels"),
        ("HeartRate", "MajorVessels"),
        ("Sex", "Disease"),
        ("BloodPressure", "Disease"),
        ("Cholesterol", "Disease"),
        ("HeartRate", "Disease"),
        ("StDepression", "Disease"),
        ("StSlope", "Disease"),
        ("MajorVessels", "Disease"),
        ("Thalassemia", "Disease"),
        ("FastingSugar", "Disease"),
        ("RestingEcg", "Disease"),
        ("Disease", "ExerciseAngina"),
        ("Disease", "ChestPain"),
    ];

    NetworkDefinition::new(variables, &edges)
}
