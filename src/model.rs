//! # The Trained Screening Model Artifact
//!
//! These structs define the public, human-readable format of the trained
//! classifier when serialized to a TOML file. The artifact is self-contained:
//! it carries the exact ordered list of training columns, the fitted label
//! encoders for the categorical fields, the linear SVM coefficients, and the
//! Platt calibration used to turn decision values into probabilities.
//!
//! The artifact is loaded once at process start. A missing or corrupt file is
//! reported as [`ModelError::ModelUnavailable`] (or a parse/shape error) and
//! the application refuses to serve predictions.

use itertools::Itertools;
use ndarray::{Array1, ArrayView1, aview1};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// A fitted bidirectional mapping between a categorical value and the integer
/// code the model was trained on, restricted to values seen during training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

/// A categorical value that was not present in the fitted encoder's classes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("categorical value '{value}' was not seen during training; known values: {}", .known.iter().join(", "))]
pub struct UnknownCategoricalValue {
    pub value: String,
    pub known: Vec<String>,
}

impl LabelEncoder {
    /// Builds an encoder whose code order is the order of `classes`.
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// The known category values, in code order. Choice lists shown to the
    /// user are sourced from here so the UI can never offer a value the
    /// model cannot consume.
    pub fn known_values(&self) -> &[String] {
        &self.classes
    }

    /// Integer code for a known value.
    pub fn encode(&self, value: &str) -> Result<usize, UnknownCategoricalValue> {
        self.classes
            .iter()
            .position(|class| class == value)
            .ok_or_else(|| UnknownCategoricalValue {
                value: value.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Value for an integer code, if the code is in range.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// The three fitted demographic encoders the model was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoders {
    pub sex: LabelEncoder,
    pub jaundice: LabelEncoder,
    pub family_asd: LabelEncoder,
}

/// Sigmoid calibration mapping SVM decision values to probabilities.
///
/// The probability of the class at code 1 is `sigmoid(a * decision + b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

/// The top-level, self-contained trained model artifact.
/// This is the structure that gets saved to and loaded from a TOML file.
/// Scalar fields come first so the serialized document stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningModel {
    /// Feature names in the exact order the SVM was trained on.
    pub training_columns: Vec<String>,
    /// Linear SVM weights, aligned to `training_columns`.
    pub weights: Vec<f64>,
    /// Linear SVM intercept.
    pub intercept: f64,
    /// Fitted encoders for the label-encoded demographic fields.
    pub encoders: CategoricalEncoders,
    /// Output-label encoder; its classes give the prediction class order.
    pub output_encoder: LabelEncoder,
    /// Probability calibration coefficients.
    pub platt: PlattScaling,
}

/// Custom error type for model loading, saving, and inference.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model artifact not found at '{0}'; predictions are unavailable")]
    ModelUnavailable(String),
    #[error("failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML model file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize model to TOML format: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error(
        "model artifact is inconsistent: {weights} weights for {columns} training columns"
    )]
    WeightDimensionMismatch { weights: usize, columns: usize },
    #[error("model output encoder must know exactly two classes, found {0}")]
    NotBinary(usize),
    #[error("feature row has {found} values but the model was trained on {expected} columns")]
    RowDimensionMismatch { found: usize, expected: usize },
}

impl ScreeningModel {
    /// Loads a trained model from a TOML file and checks its internal
    /// consistency. A missing file maps to the dedicated
    /// [`ModelError::ModelUnavailable`] condition so startup can fail fast
    /// with an actionable message.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::ModelUnavailable(path.display().to_string()));
        }
        let toml_string = fs::read_to_string(path)?;
        let model: Self = toml::from_str(&toml_string)?;
        model.check_consistency()?;
        log::info!(
            "loaded screening model: {} features, classes [{}]",
            model.training_columns.len(),
            model.output_encoder.known_values().iter().join(", ")
        );
        Ok(model)
    }

    /// Saves the model to a human-readable TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        self.check_consistency()?;
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    fn check_consistency(&self) -> Result<(), ModelError> {
        if self.weights.len() != self.training_columns.len() {
            return Err(ModelError::WeightDimensionMismatch {
                weights: self.weights.len(),
                columns: self.training_columns.len(),
            });
        }
        let num_classes = self.output_encoder.known_values().len();
        if num_classes != 2 {
            return Err(ModelError::NotBinary(num_classes));
        }
        Ok(())
    }

    /// Signed distance from the separating hyperplane: `w · x + intercept`.
    fn decision_value(&self, row: ArrayView1<f64>) -> Result<f64, ModelError> {
        if row.len() != self.training_columns.len() {
            return Err(ModelError::RowDimensionMismatch {
                found: row.len(),
                expected: self.training_columns.len(),
            });
        }
        Ok(row.dot(&aview1(&self.weights)) + self.intercept)
    }
}

/// The inference contract the session flow depends on.
///
/// Implemented by the artifact-backed [`ScreeningModel`]; the indirection is
/// what lets tests drive the session with a scripted predictor.
pub trait Predictor {
    /// Encoded class code for one feature row.
    fn predict(&self, row: ArrayView1<f64>) -> Result<usize, ModelError>;

    /// Probability distribution aligned to [`Predictor::class_order`].
    /// Entries are in `[0, 1]` and sum to 1.
    fn predict_proba(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, ModelError>;

    /// Output class labels, in code order.
    fn class_order(&self) -> &[String];

    /// Feature names in the exact training order.
    fn training_columns(&self) -> &[String];

    /// The fitted demographic encoders.
    fn encoders(&self) -> &CategoricalEncoders;
}

impl Predictor for ScreeningModel {
    fn predict(&self, row: ArrayView1<f64>) -> Result<usize, ModelError> {
        // Argmax of the calibrated distribution, so predict and
        // predict_proba can never disagree about the winning class.
        let probabilities = self.predict_proba(row)?;
        Ok(if probabilities[1] >= probabilities[0] { 1 } else { 0 })
    }

    fn predict_proba(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, ModelError> {
        let decision = self.decision_value(row)?;
        let p_one = sigmoid(self.platt.a * decision + self.platt.b);
        Ok(ndarray::array![1.0 - p_one, p_one])
    }

    fn class_order(&self) -> &[String] {
        self.output_encoder.known_values()
    }

    fn training_columns(&self) -> &[String] {
        &self.training_columns
    }

    fn encoders(&self) -> &CategoricalEncoders {
        &self.encoders
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
