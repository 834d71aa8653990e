//! # Answer Scoring and Model Wire Format
//!
//! Pure mappings between what the user typed and what the classifier
//! consumes and produces:
//!
//! - [`encode_item`] turns one five-point ordinal answer into the item's
//!   binary score, honouring the instrument's per-item polarity.
//! - [`build_feature_row`] assembles the encoded demographics and the ten
//!   scores into a row reindexed to the model's exact training-column order.
//! - [`decode_prediction`] maps the classifier's raw output back to the
//!   human-facing Yes/No result with its full probability distribution.
//!
//! Nothing here mutates state or performs IO; every function is a total
//! mapping from its inputs plus an explicit error path.

use crate::data::{Demographics, ItemKey, NUM_ITEMS, OrdinalAnswer};
use crate::model::{CategoricalEncoders, UnknownCategoricalValue};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1};
use std::collections::HashMap;
use thiserror::Error;

/// The class label meaning "ASD signs detected".
pub const POSITIVE_CLASS: &str = "Yes";
/// The class label meaning "no ASD signs detected".
pub const NEGATIVE_CLASS: &str = "No";

/// Errors produced by the codec's three mappings.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("'{0}' is not one of the five answer labels")]
    InvalidAnswer(String),
    #[error(transparent)]
    UnknownCategoricalValue(#[from] UnknownCategoricalValue),
    #[error("prediction classes must be exactly '{POSITIVE_CLASS}' and '{NEGATIVE_CLASS}', got [{}]", .0.iter().join(", "))]
    UnexpectedClassSet(Vec<String>),
    #[error("probability vector has {found} entries for {expected} classes")]
    MismatchedProbabilities { found: usize, expected: usize },
    #[error("predicted class code {code} is out of range for {num_classes} classes")]
    ClassCodeOutOfRange { code: usize, num_classes: usize },
}

/// Scores one questionnaire item from its raw answer label.
///
/// A1–A9 are reverse-scored: the atypical answers (`Kadang-kadang`, `Jarang`,
/// `Tidak pernah`) earn the point. A10 asks about a behaviour whose polarity
/// is inverted, so its scoring direction flips.
pub fn encode_item(item: ItemKey, answer_label: &str) -> Result<u8, CodecError> {
    let answer = OrdinalAnswer::parse(answer_label)
        .ok_or_else(|| CodecError::InvalidAnswer(answer_label.to_string()))?;
    Ok(score_item(item, answer))
}

/// The scoring table, once the answer label has been parsed.
pub fn score_item(item: ItemKey, answer: OrdinalAnswer) -> u8 {
    use OrdinalAnswer::*;
    let scores = if item.number() == 10 {
        matches!(answer, Always | Usually | Sometimes)
    } else {
        matches!(answer, Sometimes | Rarely | Never)
    };
    u8::from(scores)
}

/// Assembles the model input row for one completed questionnaire.
///
/// Sex, jaundice, and family-ASD are label-encoded with the fitted encoders;
/// ethnicity and administrator are one-hot expanded as `<field>_<value>`;
/// the ten scores and the age join them. The result is then reindexed to
/// exactly `training_columns`: a column the expansion did not produce is
/// filled with 0, and anything the model does not know is dropped. The output
/// therefore always has `training_columns.len()` entries in training order,
/// whatever ethnicity/administrator combination was chosen.
pub fn build_feature_row(
    demographics: &Demographics,
    scores: &[u8; NUM_ITEMS],
    encoders: &CategoricalEncoders,
    training_columns: &[String],
) -> Result<Array1<f64>, CodecError> {
    let mut values: HashMap<String, f64> = HashMap::with_capacity(NUM_ITEMS + 6);
    values.insert("Age_Mons".to_string(), f64::from(demographics.age_months));
    values.insert(
        "Sex".to_string(),
        encoders.sex.encode(&demographics.sex)? as f64,
    );
    values.insert(
        "Jaundice".to_string(),
        encoders.jaundice.encode(&demographics.jaundice)? as f64,
    );
    values.insert(
        "Family_mem_with_ASD".to_string(),
        encoders.family_asd.encode(&demographics.family_asd)? as f64,
    );
    values.insert(format!("Ethnicity_{}", demographics.ethnicity), 1.0);
    values.insert(
        format!("Who completed the test_{}", demographics.who_completed),
        1.0,
    );
    for item in ItemKey::all() {
        values.insert(item.column_name(), f64::from(scores[item.slot()]));
    }

    Ok(training_columns
        .iter()
        .map(|column| values.get(column).copied().unwrap_or(0.0))
        .collect())
}

/// The decoded outcome of one classifier invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The winning class label.
    pub label: String,
    /// Probability of [`POSITIVE_CLASS`].
    pub proba_yes: f64,
    /// Probability of [`NEGATIVE_CLASS`].
    pub proba_no: f64,
    /// Full distribution, aligned to `class_order`.
    pub probabilities: Vec<f64>,
    /// The class ordering the predictor used.
    pub class_order: Vec<String>,
}

impl Prediction {
    /// True when the model flagged ASD signs.
    pub fn is_positive(&self) -> bool {
        self.label == POSITIVE_CLASS
    }

    /// Probability of the winning class.
    pub fn winning_probability(&self) -> f64 {
        if self.is_positive() { self.proba_yes } else { self.proba_no }
    }
}

/// Maps the predictor's raw output back to a human-facing result.
///
/// `encoded_label` is the class code the predictor returned and
/// `probabilities` is the distribution aligned to `class_order`. Both
/// [`POSITIVE_CLASS`] and [`NEGATIVE_CLASS`] must be present in
/// `class_order`.
pub fn decode_prediction(
    encoded_label: usize,
    probabilities: ArrayView1<f64>,
    class_order: &[String],
) -> Result<Prediction, CodecError> {
    if probabilities.len() != class_order.len() {
        return Err(CodecError::MismatchedProbabilities {
            found: probabilities.len(),
            expected: class_order.len(),
        });
    }
    let index_yes = class_order.iter().position(|class| class == POSITIVE_CLASS);
    let index_no = class_order.iter().position(|class| class == NEGATIVE_CLASS);
    let (Some(index_yes), Some(index_no)) = (index_yes, index_no) else {
        return Err(CodecError::UnexpectedClassSet(class_order.to_vec()));
    };
    let label = class_order
        .get(encoded_label)
        .ok_or(CodecError::ClassCodeOutOfRange {
            code: encoded_label,
            num_classes: class_order.len(),
        })?
        .clone();
    Ok(Prediction {
        label,
        proba_yes: probabilities[index_yes],
        proba_no: probabilities[index_no],
        probabilities: probabilities.to_vec(),
        class_order: class_order.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LabelEncoder;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn encoders() -> CategoricalEncoders {
        CategoricalEncoders {
            sex: LabelEncoder::new(vec!["F".into(), "M".into()]),
            jaundice: LabelEncoder::new(vec!["No".into(), "Yes".into()]),
            family_asd: LabelEncoder::new(vec!["No".into(), "Yes".into()]),
        }
    }

    fn demographics() -> Demographics {
        Demographics {
            age_months: 24,
            sex: "M".into(),
            jaundice: "Yes".into(),
            family_asd: "No".into(),
            ethnicity: "Asia".into(),
            who_completed: "Diri sendiri".into(),
        }
    }

    fn classes() -> Vec<String> {
        vec!["No".into(), "Yes".into()]
    }

    #[test]
    fn a1_to_a9_score_atypical_answers() {
        for item in ItemKey::all().filter(|item| item.number() <= 9) {
            for label in ["Selalu", "Biasanya"] {
                assert_eq!(encode_item(item, label).unwrap(), 0, "{item} {label}");
            }
            for label in ["Kadang-kadang", "Jarang", "Tidak pernah"] {
                assert_eq!(encode_item(item, label).unwrap(), 1, "{item} {label}");
            }
        }
    }

    #[test]
    fn a10_scoring_direction_is_flipped() {
        let a10 = ItemKey::parse("A10").unwrap();
        for label in ["Selalu", "Biasanya", "Kadang-kadang"] {
            assert_eq!(encode_item(a10, label).unwrap(), 1, "{label}");
        }
        for label in ["Jarang", "Tidak pernah"] {
            assert_eq!(encode_item(a10, label).unwrap(), 0, "{label}");
        }
    }

    #[test]
    fn unrecognized_answer_label_is_rejected() {
        let err = encode_item(ItemKey::parse("A1").unwrap(), "Sering").unwrap_err();
        assert!(matches!(err, CodecError::InvalidAnswer(label) if label == "Sering"));
    }

    #[test]
    fn feature_row_follows_training_column_order() {
        let training_columns: Vec<String> = [
            "A10",
            "Sex",
            "Ethnicity_Asia",
            "Age_Mons",
            "A1",
            "Who completed the test_Diri sendiri",
            "Jaundice",
            "Family_mem_with_ASD",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let scores = [1, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        let row =
            build_feature_row(&demographics(), &scores, &encoders(), &training_columns).unwrap();
        assert_eq!(row.len(), training_columns.len());
        // A10=1, Sex=M→1, Ethnicity_Asia=1, Age=24, A1=1, administrator one-hot,
        // Jaundice=Yes→1, Family=No→0.
        assert_eq!(row, array![1.0, 1.0, 1.0, 24.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn columns_absent_from_the_expansion_are_zero_filled() {
        let training_columns: Vec<String> = [
            "Ethnicity_Pasifik",
            "Ethnicity_Asia",
            "Who completed the test_Yang lain",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let scores = [0; NUM_ITEMS];
        let row =
            build_feature_row(&demographics(), &scores, &encoders(), &training_columns).unwrap();
        // Only the chosen ethnicity's indicator is hot; the administrator the
        // user picked is not among the training columns and is dropped.
        assert_eq!(row, array![0.0, 1.0, 0.0]);
    }

    #[test]
    fn unknown_sex_value_surfaces_the_encoder_error() {
        let mut record = demographics();
        record.sex = "unknown".into();
        let err = build_feature_row(
            &record,
            &[0; NUM_ITEMS],
            &encoders(),
            &["Sex".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::UnknownCategoricalValue(_)));
    }

    #[test]
    fn decode_reads_probabilities_through_the_class_order() {
        let prediction = decode_prediction(1, array![0.3, 0.7].view(), &classes()).unwrap();
        assert_eq!(prediction.label, "Yes");
        assert!(prediction.is_positive());
        assert_abs_diff_eq!(prediction.proba_yes, 0.7);
        assert_abs_diff_eq!(prediction.proba_no, 0.3);
        assert_abs_diff_eq!(prediction.winning_probability(), 0.7);
        assert_abs_diff_eq!(prediction.proba_yes + prediction.proba_no, 1.0, epsilon = 1e-12);

        // Same distribution with the classes swapped.
        let swapped: Vec<String> = vec!["Yes".into(), "No".into()];
        let prediction = decode_prediction(1, array![0.7, 0.3].view(), &swapped).unwrap();
        assert_eq!(prediction.label, "No");
        assert_abs_diff_eq!(prediction.proba_yes, 0.7);
        assert_abs_diff_eq!(prediction.winning_probability(), 0.3);
    }

    #[test]
    fn decode_requires_both_output_classes() {
        let classes: Vec<String> = vec!["No".into(), "Maybe".into()];
        let err = decode_prediction(0, array![0.5, 0.5].view(), &classes).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedClassSet(_)));
    }

    #[test]
    fn decode_rejects_malformed_predictor_output() {
        let err = decode_prediction(0, array![1.0].view(), &classes()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MismatchedProbabilities { found: 1, expected: 2 }
        ));

        let err = decode_prediction(5, array![0.5, 0.5].view(), &classes()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ClassCodeOutOfRange { code: 5, num_classes: 2 }
        ));
    }
}
