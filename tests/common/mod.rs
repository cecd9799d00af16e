//! Shared synthetic cohorts for the integration tests.
//!
//! The reference cohort is constructed so the clinically expected effects
//! are unambiguous in the raw counts: disease is driven by high blood
//! pressure or high cholesterol (mostly not both), so the high-risk
//! scenario is always positive and explaining away is strongly present.

#![allow(dead_code)]

use std::sync::Arc;

use cardiograph::{
    cardio_network, fit, Discretizer, RawRecord, TrainedModel, DEFAULT_EQUIVALENT_SAMPLE_SIZE,
};

#[allow(clippy::too_many_arguments)]
pub fn raw(
    age: f64,
    sex: i64,
    cp: i64,
    bp: f64,
    chol: f64,
    fbs: i64,
    ecg: i64,
    hr: f64,
    exang: i64,
    oldpeak: f64,
    slope: i64,
    ca: i64,
    thal: i64,
    num: i64,
) -> RawRecord {
    RawRecord {
        age: Some(age),
        sex: Some(sex),
        chest_pain: Some(cp),
        resting_bp: Some(bp),
        cholesterol: Some(chol),
        fasting_sugar: Some(fbs),
        resting_ecg: Some(ecg),
        max_heart_rate: Some(hr),
        exercise_angina: Some(exang),
        st_depression: Some(oldpeak),
        st_slope: Some(slope),
        major_vessels: Some(ca),
        thalassemia: Some(thal),
        disease_code: Some(num),
    }
}

/// 240 healthy rows, 120 hypertension-driven positives with desirable
/// cholesterol, 120 cholesterol-driven positives with normal blood
/// pressure, and 30 positives with both risk factors.
pub fn reference_cohort() -> Vec<RawRecord> {
    let mut rows = Vec::with_capacity(510);

    for i in 0..240 {
        rows.push(raw(
            [35.0, 50.0, 42.0][i % 3],
            (i % 2) as i64,
            [2, 3][i % 2],
            [110.0, 125.0][i % 2],
            [180.0, 210.0][i % 2],
            0,
            0,
            [165.0, 155.0][i % 2],
            0,
            0.0,
            1,
            0,
            3,
            0,
        ));
    }

    for i in 0..120 {
        rows.push(raw(
            [65.0, 70.0][i % 2],
            (i % 2) as i64,
            4,
            [150.0, 165.0][i % 2],
            [180.0, 190.0][i % 2],
            [0, 1][i % 2],
            [1, 2][i % 2],
            [100.0, 95.0][i % 2],
            1,
            [2.5, 1.5][i % 2],
            [2, 3][i % 2],
            [1, 2][i % 2],
            7,
            [1, 3][i % 2],
        ));
    }

    for i in 0..120 {
        rows.push(raw(
            [62.0, 75.0][i % 2],
            (i % 2) as i64,
            [4, 3][i % 2],
            [105.0, 115.0][i % 2],
            [250.0, 280.0][i % 2],
            0,
            [0, 1][i % 2],
            [120.0, 130.0][i % 2],
            [1, 0][i % 2],
            [1.0, 2.5][i % 2],
            2,
            [2, 3][i % 2],
            [6, 7][i % 2],
            [2, 1][i % 2],
        ));
    }

    for _ in 0..30 {
        rows.push(raw(
            70.0, 1, 4, 160.0, 260.0, 1, 2, 95.0, 1, 3.0, 3, 3, 7, 4,
        ));
    }

    rows
}

/// Identical healthy rows with disease code 0 throughout.
pub fn all_negative_cohort(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|_| raw(50.0, 1, 3, 125.0, 210.0, 0, 0, 155.0, 0, 0.0, 1, 0, 3, 0))
        .collect()
}

/// Discretizes a cohort and fits the cardiovascular network with the
/// reference prior strength.
pub fn train(cohort: &[RawRecord]) -> TrainedModel {
    let definition = Arc::new(cardio_network().expect("valid network"));
    let discretizer = Discretizer::new(Arc::clone(&definition)).expect("discretizer");
    let table = discretizer.clean_table(cohort).expect("clean table");
    let network = fit(&definition, &table, DEFAULT_EQUIVALENT_SAMPLE_SIZE).expect("fit");
    TrainedModel {
        network: Arc::new(network),
        training_table: table,
    }
}

pub fn trained_reference_model() -> TrainedModel {
    train(&reference_cohort())
}
