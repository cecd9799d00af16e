//! Training dataset ingestion.
//!
//! Loads the clinical table from CSV into [`RawRecord`]s. The reader
//! validates the header against the fixed column set and tolerates the
//! usual missing-value markers (`?`, empty cells) by leaving the field
//! unset; the discretizer then drops such rows fail-closed. A missing file
//! is a fatal startup error.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::engine::errors::ModelError;

/// Column names of the training table, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal", "num",
];

/// One raw row of the clinical table. Every field is optional: a cell that
/// is absent, `?`, or unparseable stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawRecord {
    pub age: Option<f64>,
    pub sex: Option<i64>,
    pub chest_pain: Option<i64>,
    pub resting_bp: Option<f64>,
    pub cholesterol: Option<f64>,
    pub fasting_sugar: Option<i64>,
    pub resting_ecg: Option<i64>,
    pub max_heart_rate: Option<f64>,
    pub exercise_angina: Option<i64>,
    pub st_depression: Option<f64>,
    pub st_slope: Option<i64>,
    pub major_vessels: Option<i64>,
    pub thalassemia: Option<i64>,
    pub disease_code: Option<i64>,
}

/// Loads all rows of a clinical CSV table.
///
/// Fails with [`ModelError::DatasetNotFound`] when the file does not exist
/// and [`ModelError::DatasetFormat`] when the header is missing a required
/// column or a row cannot be read. Extra columns are ignored.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, ModelError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ModelError::DatasetNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ModelError::DatasetFormat(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| ModelError::DatasetFormat(e.to_string()))?
        .clone();
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
    for (idx, name) in headers.iter().enumerate() {
        positions.entry(name).or_insert(idx);
    }
    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
        columns[slot] = *positions.get(name).ok_or_else(|| {
            ModelError::DatasetFormat(format!("missing required column '{}'", name))
        })?;
    }

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ModelError::DatasetFormat(e.to_string()))?;
        let cell = |slot: usize| row.get(columns[slot]);
        rows.push(RawRecord {
            age: parse_number(cell(0)),
            sex: parse_code(cell(1)),
            chest_pain: parse_code(cell(2)),
            resting_bp: parse_number(cell(3)),
            cholesterol: parse_number(cell(4)),
            fasting_sugar: parse_code(cell(5)),
            resting_ecg: parse_code(cell(6)),
            max_heart_rate: parse_number(cell(7)),
            exercise_angina: parse_code(cell(8)),
            st_depression: parse_number(cell(9)),
            st_slope: parse_code(cell(10)),
            major_vessels: parse_code(cell(11)),
            thalassemia: parse_code(cell(12)),
            disease_code: parse_code(cell(13)),
        });
    }

    log::info!("loaded {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_number(cell: Option<&str>) -> Option<f64> {
    let text = cell?.trim();
    if text.is_empty() || text == "?" {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coded fields sometimes arrive as floats (`3.0`); accept them when the
/// value is integral.
fn parse_code(cell: Option<&str>) -> Option<i64> {
    let value = parse_number(cell)?;
    if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}
