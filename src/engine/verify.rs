//! Read-only diagnostics for a trained network.
//!
//! Three checks, all pure queries against the shared network plus the
//! retained training table:
//!
//! - **Calibration**: empirical `Positive` prevalence in the training table
//!   vs. the model's unconditional marginal for the same label. The
//!   absolute difference is a proxy for calibration error.
//! - **Clinical scenario**: probability of disease under a canonical
//!   high-risk profile (old age, high blood pressure, high cholesterol). A
//!   sane model assigns this profile elevated risk.
//! - **Explaining away**: P(high cholesterol | disease) against
//!   P(high cholesterol | disease, high blood pressure). With both causes
//!   competing for the same effect, conditioning on one should lower the
//!   posterior of the other.

use std::fmt;

use serde::Serialize;

use crate::data::TrainingRecord;
use crate::engine::cpt::TrainedNetwork;
use crate::engine::errors::ModelError;
use crate::engine::evidence::Evidence;

/// Empirical prevalence vs. model marginal for the `Positive` target label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Fraction of training records with `Disease = Positive`.
    pub dataset_prevalence: f64,
    /// The model's unconditional marginal P(Disease = Positive).
    pub model_probability: f64,
    /// Absolute difference of the two.
    pub difference: f64,
}

/// Model output for the canonical high-risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClinicalScenarioReport {
    /// P(Disease = Positive | Age=Old, BloodPressure=High, Cholesterol=High).
    pub positive_probability: f64,
}

/// Direction of the explaining-away contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExplainingAwayVerdict {
    /// The conditional-on-BP probability is strictly lower: the competing
    /// cause was explained away.
    Dropped,
    /// No drop observed.
    IncreasedOrSame,
}

impl fmt::Display for ExplainingAwayVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropped => write!(f, "dropped"),
            Self::IncreasedOrSame => write!(f, "increased/same"),
        }
    }
}

/// The inter-causal competition check between blood pressure and
/// cholesterol as causes of disease.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExplainingAwayReport {
    /// P(Cholesterol = High | Disease = Positive).
    pub p_high_cholesterol_given_disease: f64,
    /// P(Cholesterol = High | Disease = Positive, BloodPressure = High).
    pub p_high_cholesterol_given_disease_and_high_bp: f64,
    pub verdict: ExplainingAwayVerdict,
}

/// All three diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationReport {
    pub calibration: CalibrationReport,
    pub clinical_scenario: ClinicalScenarioReport,
    pub explaining_away: ExplainingAwayReport,
}

/// Runs all diagnostics. Read-only: the network and table are borrowed,
/// queried, and left untouched.
pub fn verify(
    network: &TrainedNetwork,
    table: &[TrainingRecord],
) -> Result<VerificationReport, ModelError> {
    if table.is_empty() {
        return Err(ModelError::EmptyDatasetAfterCleaning);
    }
    let definition = network.definition();
    let disease = definition
        .var_id("Disease")
        .ok_or_else(|| ModelError::UnknownVariable {
            name: "Disease".into(),
        })?;
    let positive = definition
        .variable(disease)
        .label_index("Positive")
        .ok_or_else(|| ModelError::UnknownEvidenceLabel {
            variable: "Disease".into(),
            label: "Positive".into(),
        })?;

    let positives = table
        .iter()
        .filter(|r| r.label_index(disease) == positive)
        .count();
    let dataset_prevalence = positives as f64 / table.len() as f64;
    let model_probability = network.positive_probability(&Evidence::new())?;
    let calibration = CalibrationReport {
        dataset_prevalence,
        model_probability,
        difference: (dataset_prevalence - model_probability).abs(),
    };

    let high_risk = Evidence::new()
        .with("Age", "Old")
        .with("BloodPressure", "High")
        .with("Cholesterol", "High");
    let clinical_scenario = ClinicalScenarioReport {
        positive_probability: network.positive_probability(&high_risk)?,
    };

    let baseline = network
        .query(
            &["Cholesterol"],
            &Evidence::new().with("Disease", "Positive"),
        )?
        .probability_of("Cholesterol", "High")
        .ok_or_else(|| ModelError::UnknownEvidenceLabel {
            variable: "Cholesterol".into(),
            label: "High".into(),
        })?;
    let conditioned = network
        .query(
            &["Cholesterol"],
            &Evidence::new()
                .with("Disease", "Positive")
                .with("BloodPressure", "High"),
        )?
        .probability_of("Cholesterol", "High")
        .ok_or_else(|| ModelError::UnknownEvidenceLabel {
            variable: "Cholesterol".into(),
            label: "High".into(),
        })?;

    let explaining_away = ExplainingAwayReport {
        p_high_cholesterol_given_disease: baseline,
        p_high_cholesterol_given_disease_and_high_bp: conditioned,
        verdict: if conditioned < baseline {
            ExplainingAwayVerdict::Dropped
        } else {
            ExplainingAwayVerdict::IncreasedOrSame
        },
    };

    log::info!(
        "verification: prevalence={:.4} model={:.4} scenario={:.4} explaining-away={}",
        calibration.dataset_prevalence,
        calibration.model_probability,
        clinical_scenario.positive_probability,
        explaining_away.verdict
    );

    Ok(VerificationReport {
        calibration,
        clinical_scenario,
        explaining_away,
    })
}
