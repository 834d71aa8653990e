//! # The Three-Step Session Flow
//!
//! `Demographics → Questionnaire → Result`, with `go_back` from the
//! questionnaire and `reset` from anywhere. Each user owns exactly one
//! [`Session`]; there is no process-wide state. The presentation layer reads
//! [`Session::page`] to decide which screen to render and drives the four
//! transitions below; any call issued from the wrong page is a
//! programming-contract violation reported as
//! [`SessionError::InvalidStateTransition`].
//!
//! Failed transitions never advance the page and never leave partial data
//! behind: a prediction that fails keeps the session on the questionnaire so
//! the user can retry.

use crate::codec::{self, CodecError, Prediction};
use crate::data::{Answers, Demographics, ItemKey, NUM_ITEMS, ValidationError};
use crate::model::{ModelError, Predictor};
use itertools::Itertools;
use thiserror::Error;

/// Which screen the presentation layer should be showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Demographics,
    Questionnaire,
    Result,
}

/// A codec or model failure inside one prediction attempt.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors returned by the session transitions.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("'{operation}' is not valid on the {page:?} page")]
    InvalidStateTransition {
        operation: &'static str,
        page: Page,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("items {} have not been answered yet", .missing.iter().join(", "))]
    IncompleteQuestionnaire { missing: Vec<ItemKey> },
    #[error("prediction failed: {0}")]
    PredictionFailed(#[source] PredictionError),
}

/// One user's screening session.
///
/// Holds the current page and the records collected so far. The records obey
/// the page invariant: scores exist only once the questionnaire has been
/// submitted, a prediction exists only on the result page, and the
/// demographic record survives `go_back` so the form can be re-rendered
/// pre-filled.
#[derive(Debug, Default)]
pub struct Session {
    page: Page,
    demographics: Option<Demographics>,
    scores: Option<[u8; NUM_ITEMS]>,
    result: Option<Prediction>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn demographics(&self) -> Option<&Demographics> {
        self.demographics.as_ref()
    }

    /// The ten item scores, present from the result page on.
    pub fn scores(&self) -> Option<&[u8; NUM_ITEMS]> {
        self.scores.as_ref()
    }

    pub fn result(&self) -> Option<&Prediction> {
        self.result.as_ref()
    }

    /// Accepts the step-1 record and advances to the questionnaire.
    ///
    /// Only valid on the demographics page. The record is validated against
    /// the predictor's fitted encoders and the fixed choice lists before it
    /// is stored; re-submitting after [`Session::go_back`] overwrites the
    /// previous record.
    pub fn submit_demographics(
        &mut self,
        record: Demographics,
        predictor: &dyn Predictor,
    ) -> Result<(), SessionError> {
        if self.page != Page::Demographics {
            return Err(SessionError::InvalidStateTransition {
                operation: "submit_demographics",
                page: self.page,
            });
        }
        record.validate(predictor.encoders())?;
        log::info!("demographics accepted (age {} months)", record.age_months);
        self.demographics = Some(record);
        self.page = Page::Questionnaire;
        Ok(())
    }

    /// Scores the completed answer sheet, runs the predictor, and advances
    /// to the result page.
    ///
    /// Only valid on the questionnaire page, and only once all ten items are
    /// answered. A codec or predictor failure is reported as
    /// [`SessionError::PredictionFailed`] and the session stays on the
    /// questionnaire with no partial result stored.
    pub fn submit_questionnaire(
        &mut self,
        answers: &Answers,
        predictor: &dyn Predictor,
    ) -> Result<&Prediction, SessionError> {
        if self.page != Page::Questionnaire {
            return Err(SessionError::InvalidStateTransition {
                operation: "submit_questionnaire",
                page: self.page,
            });
        }
        let missing = answers.missing();
        if !missing.is_empty() {
            return Err(SessionError::IncompleteQuestionnaire { missing });
        }
        // This unwrap is safe: the questionnaire page is only reachable
        // through submit_demographics, which stores the record.
        let demographics = self.demographics.as_ref().unwrap();

        let scores = score_sheet(answers);
        let prediction = run_prediction(demographics, &scores, predictor)
            .map_err(SessionError::PredictionFailed)?;
        log::info!(
            "prediction stored: {} ({:.1}% confidence)",
            prediction.label,
            prediction.winning_probability() * 100.0
        );
        self.scores = Some(scores);
        self.result = Some(prediction);
        self.page = Page::Result;
        // This unwrap is safe: result was stored on the line above.
        Ok(self.result.as_ref().unwrap())
    }

    /// Returns from the questionnaire to the demographics page.
    ///
    /// The stored record is kept so the form may be re-rendered pre-filled;
    /// whether to pre-fill is the presentation layer's choice.
    pub fn go_back(&mut self) -> Result<(), SessionError> {
        if self.page != Page::Questionnaire {
            return Err(SessionError::InvalidStateTransition {
                operation: "go_back",
                page: self.page,
            });
        }
        self.page = Page::Demographics;
        Ok(())
    }

    /// Clears every record and returns to the demographics page.
    /// Valid from any state; idempotent.
    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

/// Scores a complete answer sheet. Completeness is the caller's invariant.
fn score_sheet(answers: &Answers) -> [u8; NUM_ITEMS] {
    let mut scores = [0u8; NUM_ITEMS];
    for item in ItemKey::all() {
        // This unwrap is safe: missing items were rejected before scoring.
        scores[item.slot()] = codec::score_item(item, answers.get(item).unwrap());
    }
    scores
}

fn run_prediction(
    demographics: &Demographics,
    scores: &[u8; NUM_ITEMS],
    predictor: &dyn Predictor,
) -> Result<Prediction, PredictionError> {
    let row = codec::build_feature_row(
        demographics,
        scores,
        predictor.encoders(),
        predictor.training_columns(),
    )?;
    let encoded = predictor.predict(row.view())?;
    let probabilities = predictor.predict_proba(row.view())?;
    Ok(codec::decode_prediction(
        encoded,
        probabilities.view(),
        predictor.class_order(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OrdinalAnswer;
    use crate::model::{CategoricalEncoders, LabelEncoder};
    use ndarray::{Array1, ArrayView1, array};

    /// A predictor stub with a fixed answer, or a scripted failure.
    struct Scripted {
        classes: Vec<String>,
        columns: Vec<String>,
        encoders: CategoricalEncoders,
        fail: bool,
    }

    impl Scripted {
        fn new(fail: bool) -> Self {
            Scripted {
                classes: vec!["No".into(), "Yes".into()],
                columns: vec!["A1".into(), "Age_Mons".into()],
                encoders: CategoricalEncoders {
                    sex: LabelEncoder::new(vec!["F".into(), "M".into()]),
                    jaundice: LabelEncoder::new(vec!["No".into(), "Yes".into()]),
                    family_asd: LabelEncoder::new(vec!["No".into(), "Yes".into()]),
                },
                fail,
            }
        }
    }

    impl Predictor for Scripted {
        fn predict(&self, _row: ArrayView1<f64>) -> Result<usize, ModelError> {
            if self.fail {
                return Err(ModelError::RowDimensionMismatch { found: 0, expected: 2 });
            }
            Ok(1)
        }

        fn predict_proba(&self, _row: ArrayView1<f64>) -> Result<Array1<f64>, ModelError> {
            Ok(array![0.25, 0.75])
        }

        fn class_order(&self) -> &[String] {
            &self.classes
        }

        fn training_columns(&self) -> &[String] {
            &self.columns
        }

        fn encoders(&self) -> &CategoricalEncoders {
            &self.encoders
        }
    }

    fn record() -> Demographics {
        Demographics {
            age_months: 30,
            sex: "M".into(),
            jaundice: "No".into(),
            family_asd: "Yes".into(),
            ethnicity: "Latin".into(),
            who_completed: "Anggota Keluarga".into(),
        }
    }

    fn full_sheet(answer: OrdinalAnswer) -> Answers {
        let mut answers = Answers::new();
        for item in ItemKey::all() {
            answers.set(item, answer);
        }
        answers
    }

    #[test]
    fn questionnaire_before_demographics_is_a_contract_violation() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        let err = session
            .submit_questionnaire(&full_sheet(OrdinalAnswer::Never), &predictor)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition {
                operation: "submit_questionnaire",
                page: Page::Demographics,
            }
        ));
        assert_eq!(session.page(), Page::Demographics);
    }

    #[test]
    fn happy_path_reaches_the_result_page() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        session.submit_demographics(record(), &predictor).unwrap();
        assert_eq!(session.page(), Page::Questionnaire);
        assert!(session.result().is_none());

        let prediction = session
            .submit_questionnaire(&full_sheet(OrdinalAnswer::Never), &predictor)
            .unwrap();
        assert_eq!(prediction.label, "Yes");
        assert_eq!(session.page(), Page::Result);
        assert!(session.scores().is_some());
    }

    #[test]
    fn invalid_demographics_do_not_advance() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        let mut bad = record();
        bad.age_months = 48;
        let err = session.submit_demographics(bad, &predictor).unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(session.page(), Page::Demographics);
        assert!(session.demographics().is_none());
    }

    #[test]
    fn incomplete_sheet_lists_the_missing_items() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        session.submit_demographics(record(), &predictor).unwrap();

        let mut answers = Answers::new();
        for item in ItemKey::all().filter(|item| item.number() != 4 && item.number() != 9) {
            answers.set(item, OrdinalAnswer::Always);
        }
        let err = session.submit_questionnaire(&answers, &predictor).unwrap_err();
        match err {
            SessionError::IncompleteQuestionnaire { missing } => {
                let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
                assert_eq!(missing, ["A4", "A9"]);
            }
            other => panic!("expected IncompleteQuestionnaire, got {other:?}"),
        }
        assert_eq!(session.page(), Page::Questionnaire);
    }

    #[test]
    fn prediction_failure_keeps_the_questionnaire_page() {
        let predictor = Scripted::new(true);
        let mut session = Session::new();
        session.submit_demographics(record(), &predictor).unwrap();
        let err = session
            .submit_questionnaire(&full_sheet(OrdinalAnswer::Always), &predictor)
            .unwrap_err();
        assert!(matches!(err, SessionError::PredictionFailed(_)));
        assert_eq!(session.page(), Page::Questionnaire);
        assert!(session.result().is_none());
        assert!(session.scores().is_none());
    }

    #[test]
    fn go_back_keeps_the_demographic_record() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        session.submit_demographics(record(), &predictor).unwrap();
        session.go_back().unwrap();
        assert_eq!(session.page(), Page::Demographics);
        assert_eq!(session.demographics(), Some(&record()));

        // Re-submitting overwrites the kept record.
        let mut updated = record();
        updated.age_months = 18;
        session.submit_demographics(updated.clone(), &predictor).unwrap();
        assert_eq!(session.demographics(), Some(&updated));
    }

    #[test]
    fn go_back_is_only_valid_on_the_questionnaire_page() {
        let mut session = Session::new();
        assert!(matches!(
            session.go_back().unwrap_err(),
            SessionError::InvalidStateTransition { operation: "go_back", page: Page::Demographics }
        ));
    }

    #[test]
    fn reset_clears_everything_and_is_idempotent() {
        let predictor = Scripted::new(false);
        let mut session = Session::new();
        session.submit_demographics(record(), &predictor).unwrap();
        session
            .submit_questionnaire(&full_sheet(OrdinalAnswer::Sometimes), &predictor)
            .unwrap();
        assert_eq!(session.page(), Page::Result);

        session.reset();
        assert_eq!(session.page(), Page::Demographics);
        assert!(session.demographics().is_none());
        assert!(session.scores().is_none());
        assert!(session.result().is_none());

        // A second reset observes exactly the same state.
        session.reset();
        assert_eq!(session.page(), Page::Demographics);
        assert!(session.demographics().is_none());
        assert!(session.scores().is_none());
        assert!(session.result().is_none());
    }
}
