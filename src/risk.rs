//! Post-hoc treatment adjustment and risk categorization.
//!
//! Treatment effects are a deterministic multiplier heuristic applied to
//! the engine's output, not part of the probabilistic core: a pure function
//! from (base probability, treatment selections) to adjusted probability.
//! Nothing here is folded into CPTs or inference.

use serde::{Deserialize, Serialize};

/// Statin therapy intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Statin {
    #[default]
    None,
    /// Risk multiplier 0.70.
    Moderate,
    /// Risk multiplier 0.57.
    High,
}

/// Blood-pressure medication regimen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BpMedication {
    #[default]
    None,
    /// Risk multiplier 0.65.
    Monotherapy,
    /// Risk multiplier 0.43.
    Dual,
}

/// Selected treatments to apply on top of a base risk estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub statin: Statin,
    pub bp_medication: BpMedication,
    /// Percutaneous coronary intervention; risk multiplier 0.80.
    pub pci: bool,
}

/// Applies the treatment multipliers to a base probability, clamped to
/// [0, 1].
pub fn adjusted_risk(base_probability: f64, plan: &TreatmentPlan) -> f64 {
    let mut risk = base_probability;
    risk *= match plan.statin {
        Statin::None => 1.0,
        Statin::Moderate => 0.70,
        Statin::High => 0.57,
    };
    risk *= match plan.bp_medication {
        BpMedication::None => 1.0,
        BpMedication::Monotherapy => 0.65,
        BpMedication::Dual => 0.43,
    };
    if plan.pci {
        risk *= 0.80;
    }
    risk.clamp(0.0, 1.0)
}

/// Coarse risk categorization for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    /// High when the probability exceeds 0.5, Low otherwise.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.5 {
            Self::High
        } else {
            Self::Low
        }
    }
}
