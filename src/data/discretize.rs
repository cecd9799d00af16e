//! Discretization of raw clinical measurements into categorical labels.
//!
//! Continuous fields are binned with fixed half-open intervals and coded
//! fields are mapped through fixed label tables. The boundary conventions
//! intentionally differ per field (age and heart rate are left-closed,
//! blood pressure and cholesterol right-open, ST-depression right-closed);
//! training data and downstream clinical thresholds were calibrated against
//! these exact boundaries, so they are reproduced verbatim.
//!
//! The policy is fail-closed: a record producing an unmapped or
//! out-of-domain value for any retained field is dropped entirely. No
//! partial records and no imputation.

use std::sync::Arc;

use crate::data::dataset::RawRecord;
use crate::data::TrainingRecord;
use crate::engine::errors::ModelError;
use crate::engine::network::NetworkDefinition;

/// Maps raw records onto the categorical domains of a network definition.
#[derive(Debug, Clone)]
pub struct Discretizer {
    definition: Arc<NetworkDefinition>,
}

impl Discretizer {
    /// Creates a discretizer for a definition that declares all fourteen
    /// clinical variables.
    pub fn new(definition: Arc<NetworkDefinition>) -> Result<Self, ModelError> {
        for name in [
            "Age",
            "Sex",
            "ChestPain",
            "BloodPressure",
            "Cholesterol",
            "FastingSugar",
            "RestingEcg",
            "HeartRate",
            "ExerciseAngina",
            "StDepression",
            "StSlope",
            "MajorVessels",
            "Thalassemia",
            "Disease",
        ] {
            if definition.var_id(name).is_none() {
                return Err(ModelError::InvalidGraph(format!(
                    "definition does not declare variable '{}'",
                    name
                )));
            }
        }
        Ok(Self { definition })
    }

    /// Discretizes one raw record.
    ///
    /// `Ok(None)` means the record was dropped (missing or unmappable
    /// field); `Err` means a produced label does not exist in the
    /// definition's domain, which is a configuration error, not a data
    /// error.
    pub fn discretize(&self, raw: &RawRecord) -> Result<Option<TrainingRecord>, ModelError> {
        let mapped = [
            ("Age", bin_left_closed(raw.age, [0.0, 45.0, 60.0, 120.0], ["Young", "Middle", "Old"])),
            ("Sex", map_code(raw.sex, &[(0, "Female"), (1, "Male")])),
            (
                "ChestPain",
                map_code(
                    raw.chest_pain,
                    &[
                        (1, "TypicalAngina"),
                        (2, "AtypicalAngina"),
                        (3, "NonAnginal"),
                        (4, "Asymptomatic"),
                    ],
                ),
            ),
            (
                "BloodPressure",
                bin_left_closed(
                    raw.resting_bp,
                    [0.0, 120.0, 140.0, 300.0],
                    ["Normal", "Elevated", "High"],
                ),
            ),
            (
                "Cholesterol",
                bin_left_closed(
                    raw.cholesterol,
                    [0.0, 200.0, 240.0, 600.0],
                    ["Desirable", "Borderline", "High"],
                ),
            ),
            ("FastingSugar", map_code(raw.fasting_sugar, &[(0, "Normal"), (1, "High")])),
            (
                "RestingEcg",
                map_code(
                    raw.resting_ecg,
                    &[(0, "Normal"), (1, "StAbnormality"), (2, "Lvh")],
                ),
            ),
            (
                "HeartRate",
                bin_left_closed(
                    raw.max_heart_rate,
                    [0.0, 110.0, 150.0, 250.0],
                    ["Low", "Normal", "High"],
                ),
            ),
            ("ExerciseAngina", map_code(raw.exercise_angina, &[(0, "No"), (1, "Yes")])),
            (
                "StDepression",
                bin_right_closed(
                    raw.st_depression,
                    [-1.0, 0.0, 2.0, 10.0],
                    ["None", "Ischemia", "Severe"],
                ),
            ),
            (
                "StSlope",
                map_code(
                    raw.st_slope,
                    &[(1, "Upsloping"), (2, "Flat"), (3, "Downsloping")],
                ),
            ),
            (
                "MajorVessels",
                map_code(
                    raw.major_vessels,
                    &[(0, "0Vessels"), (1, "1Vessels"), (2, "2Vessels"), (3, "3Vessels")],
                ),
            ),
            (
                "Thalassemia",
                map_code(
                    raw.thalassemia,
                    &[(3, "Normal"), (6, "FixedDefect"), (7, "ReversibleDefect")],
                ),
            ),
            ("Disease", disease_label(raw.disease_code)),
        ];

        let mut labels = vec![0usize; self.definition.variable_count()];
        for (name, label) in mapped {
            let Some(label) = label else {
                return Ok(None);
            };
            let id = self
                .definition
                .var_id(name)
                .ok_or_else(|| ModelError::InvalidGraph(format!("variable '{}' vanished", name)))?;
            let index = self
                .definition
                .variable(id)
                .label_index(label)
                .ok_or_else(|| {
                    ModelError::InvalidGraph(format!(
                        "definition domain for '{}' is missing label '{}'",
                        name, label
                    ))
                })?;
            labels[id.0 as usize] = index;
        }
        Ok(Some(TrainingRecord::new(labels)))
    }

    /// Discretizes a whole table, dropping unmappable rows.
    pub fn clean_table(&self, rows: &[RawRecord]) -> Result<Vec<TrainingRecord>, ModelError> {
        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            if let Some(record) = self.discretize(raw)? {
                records.push(record);
            }
        }
        log::info!(
            "discretized {} of {} raw rows ({} dropped)",
            records.len(),
            rows.len(),
            rows.len() - records.len()
        );
        Ok(records)
    }
}

/// Bins into `[b0,b1) [b1,b2) [b2,b3)`.
fn bin_left_closed(
    value: Option<f64>,
    bounds: [f64; 4],
    labels: [&'static str; 3],
) -> Option<&'static str> {
    let v = value.filter(|v| v.is_finite())?;
    for (slot, label) in labels.iter().enumerate() {
        if v >= bounds[slot] && v < bounds[slot + 1] {
            return Some(label);
        }
    }
    None
}

/// Bins into `(b0,b1] (b1,b2] (b2,b3]`.
fn bin_right_closed(
    value: Option<f64>,
    bounds: [f64; 4],
    labels: [&'static str; 3],
) -> Option<&'static str> {
    let v = value.filter(|v| v.is_finite())?;
    for (slot, label) in labels.iter().enumerate() {
        if v > bounds[slot] && v <= bounds[slot + 1] {
            return Some(label);
        }
    }
    None
}

fn map_code(code: Option<i64>, table: &[(i64, &'static str)]) -> Option<&'static str> {
    let code = code?;
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, label)| *label)
}

/// Disease severity codes collapse to Positive at threshold > 0.
fn disease_label(code: Option<i64>) -> Option<&'static str> {
    match code? {
        0 => Some("Negative"),
        c if c > 0 => Some("Positive"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::network::cardio_network;

    fn discretizer() -> Discretizer {
        let definition = Arc::new(cardio_network().expect("valid network"));
        Discretizer::new(definition).expect("discretizer")
    }

    /// A raw record that maps cleanly under every table.
    fn complete_record() -> RawRecord {
        RawRecord {
            age: Some(70.0),
            sex: Some(1),
            chest_pain: Some(4),
            resting_bp: Some(150.0),
            cholesterol: Some(250.0),
            fasting_sugar: Some(0),
            resting_ecg: Some(2),
            max_heart_rate: Some(120.0),
            exercise_angina: Some(1),
            st_depression: Some(2.5),
            st_slope: Some(2),
            major_vessels: Some(2),
            thalassemia: Some(7),
            disease_code: Some(3),
        }
    }

    fn label_of(record: &TrainingRecord, variable: &str) -> String {
        let definition = cardio_network().expect("valid network");
        let id = definition.var_id(variable).expect("declared");
        definition.variable(id).labels()[record.label_index(id)].clone()
    }

    #[test]
    fn canonical_examples_map_to_expected_labels() {
        let d = discretizer();
        let record = d
            .discretize(&complete_record())
            .expect("no config error")
            .expect("record retained");

        assert_eq!(label_of(&record, "Age"), "Old");
        assert_eq!(label_of(&record, "Sex"), "Male");
        assert_eq!(label_of(&record, "BloodPressure"), "High");
        assert_eq!(label_of(&record, "Cholesterol"), "High");
        assert_eq!(label_of(&record, "HeartRate"), "Normal");
        assert_eq!(label_of(&record, "StDepression"), "Severe");
        assert_eq!(label_of(&record, "Thalassemia"), "ReversibleDefect");
        assert_eq!(label_of(&record, "MajorVessels"), "2Vessels");
        assert_eq!(label_of(&record, "Disease"), "Positive");
    }

    #[test]
    fn interval_boundaries_follow_field_conventions() {
        let d = discretizer();
        let mut raw = complete_record();

        // Age is left-closed: 45 starts Middle, 60 starts Old.
        raw.age = Some(44.9);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "Age"), "Young");
        raw.age = Some(45.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "Age"), "Middle");
        raw.age = Some(60.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "Age"), "Old");

        // Blood pressure is right-open: 120 is already Elevated, 140 High.
        raw.age = Some(70.0);
        raw.resting_bp = Some(120.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "BloodPressure"), "Elevated");
        raw.resting_bp = Some(140.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "BloodPressure"), "High");

        // Cholesterol likewise: 200 Borderline, 240 High.
        raw.resting_bp = Some(150.0);
        raw.cholesterol = Some(200.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "Cholesterol"), "Borderline");
        raw.cholesterol = Some(240.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "Cholesterol"), "High");

        // ST-depression is right-closed: 0 is still None, 2.0 still Ischemia.
        raw.cholesterol = Some(250.0);
        raw.st_depression = Some(0.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "StDepression"), "None");
        raw.st_depression = Some(2.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "StDepression"), "Ischemia");

        // Heart rate is left-closed: 110 Normal, 150 High.
        raw.st_depression = Some(2.5);
        raw.max_heart_rate = Some(110.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "HeartRate"), "Normal");
        raw.max_heart_rate = Some(150.0);
        let r = d.discretize(&raw).unwrap().expect("retained");
        assert_eq!(label_of(&r, "HeartRate"), "High");
    }

    #[test]
    fn unmapped_values_drop_the_whole_record() {
        let d = discretizer();

        let mut raw = complete_record();
        raw.age = None;
        assert!(d.discretize(&raw).unwrap().is_none());

        let mut raw = complete_record();
        raw.age = Some(130.0);
        assert!(d.discretize(&raw).unwrap().is_none());

        let mut raw = complete_record();
        raw.thalassemia = Some(5);
        assert!(d.discretize(&raw).unwrap().is_none());

        let mut raw = complete_record();
        raw.major_vessels = Some(4);
        assert!(d.discretize(&raw).unwrap().is_none());

        // (-1, 0] is open at -1.
        let mut raw = complete_record();
        raw.st_depression = Some(-1.0);
        assert!(d.discretize(&raw).unwrap().is_none());

        let mut raw = complete_record();
        raw.disease_code = Some(-1);
        assert!(d.discretize(&raw).unwrap().is_none());
    }

    #[test]
    fn clean_table_keeps_only_complete_rows() {
        let d = discretizer();
        let mut bad = complete_record();
        bad.sex = Some(2);
        let rows = vec![complete_record(), bad, complete_record()];

        let records = d.clean_table(&rows).expect("clean");
        assert_eq!(records.len(), 2);
    }
}
