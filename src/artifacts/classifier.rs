//! Trained win/loss classifier.
//!
//! The model is produced offline and shipped as `model.json`: a one-hot
//! encoder over the categorical columns feeding a logistic regression over
//! the numeric ones. Inference never looks past that contract; the classifier
//! only has to turn a [`FeatureRow`] into `[loss, win]`.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::chase::models::FeatureRow;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("column '{column}' has unseen category '{value}'")]
    UnknownCategory { column: String, value: String },
    #[error("column '{0}' is not present in the feature row")]
    MissingColumn(String),
    #[error("column '{column}' is not finite ({value})")]
    NonFinite { column: String, value: f64 },
    #[error("classifier produced an invalid probability pair [{0}, {1}]")]
    InvalidOutput(f64, f64),
}

/// Anything that can score a feature row.
pub trait WinClassifier: Send + Sync {
    /// Return `[loss_probability, win_probability]` for the batting side.
    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "unversioned"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalTerm {
    pub column: String,
    pub categories: Vec<String>,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumericTerm {
    pub column: String,
    pub weight: f64,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// Serialized form of `model.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticSpec {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub intercept: f64,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelSpecError {
    #[error("categorical column '{column}' has {categories} categories but {weights} weights")]
    WeightMismatch {
        column: String,
        categories: usize,
        weights: usize,
    },
    #[error("column '{0}' is not a known feature column")]
    UnknownColumn(String),
    #[error("numeric column '{0}' has a zero or non-finite scale")]
    BadScale(String),
    #[error("model has no terms")]
    Empty,
}

/// One-hot + logistic regression pipeline.
#[derive(Debug, Clone)]
pub struct LogisticPipeline {
    name: String,
    version: String,
    intercept: f64,
    categorical: Vec<(String, HashMap<String, f64>)>,
    numeric: Vec<NumericTerm>,
}

const CATEGORICAL_COLUMNS: [&str; 3] = ["batting_team", "bowling_team", "city"];
const NUMERIC_COLUMNS: [&str; 6] = [
    "Score",
    "Wickets",
    "Remaining Balls",
    "target_left",
    "crr",
    "rrr",
];

impl LogisticPipeline {
    /// Build the pipeline, checking that every term refers to a real column
    /// and that each category has exactly one weight.
    pub fn from_spec(spec: LogisticSpec) -> Result<Self, ModelSpecError> {
        if spec.categorical.is_empty() && spec.numeric.is_empty() {
            return Err(ModelSpecError::Empty);
        }

        let mut categorical = Vec::with_capacity(spec.categorical.len());
        for term in spec.categorical {
            if !CATEGORICAL_COLUMNS.contains(&term.column.as_str()) {
                return Err(ModelSpecError::UnknownColumn(term.column));
            }
            if term.categories.len() != term.weights.len() {
                return Err(ModelSpecError::WeightMismatch {
                    column: term.column,
                    categories: term.categories.len(),
                    weights: term.weights.len(),
                });
            }
            let levels: HashMap<String, f64> =
                term.categories.into_iter().zip(term.weights).collect();
            categorical.push((term.column, levels));
        }

        for term in &spec.numeric {
            if !NUMERIC_COLUMNS.contains(&term.column.as_str()) {
                return Err(ModelSpecError::UnknownColumn(term.column.clone()));
            }
            if term.scale == 0.0 || !term.scale.is_finite() {
                return Err(ModelSpecError::BadScale(term.column.clone()));
            }
        }

        Ok(LogisticPipeline {
            name: spec.name,
            version: spec.version.unwrap_or_else(|| "unversioned".to_string()),
            intercept: spec.intercept,
            categorical,
            numeric: spec.numeric,
        })
    }

    /// Linear score (log-odds of a batting win) for a row.
    fn logit(&self, row: &FeatureRow) -> Result<f64, InferenceError> {
        let mut z = self.intercept;

        for (column, levels) in &self.categorical {
            let value = row
                .categorical(column)
                .ok_or_else(|| InferenceError::MissingColumn(column.clone()))?;
            let weight = levels
                .get(value)
                .ok_or_else(|| InferenceError::UnknownCategory {
                    column: column.clone(),
                    value: value.to_string(),
                })?;
            z += weight;
        }

        for term in &self.numeric {
            let value = row
                .numeric(&term.column)
                .ok_or_else(|| InferenceError::MissingColumn(term.column.clone()))?;
            if !value.is_finite() {
                return Err(InferenceError::NonFinite {
                    column: term.column.clone(),
                    value,
                });
            }
            z += term.weight * (value - term.mean) / term.scale;
        }

        Ok(z)
    }
}

impl WinClassifier for LogisticPipeline {
    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
        let win = sigmoid(self.logit(row)?);
        let loss = 1.0 - win;
        if !(0.0..=1.0).contains(&win) || !(0.0..=1.0).contains(&loss) {
            return Err(InferenceError::InvalidOutput(loss, win));
        }
        Ok([loss, win])
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
