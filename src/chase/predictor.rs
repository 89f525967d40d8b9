use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::artifacts::{ArtifactStore, InferenceError};

use super::features::{classify, derive};
use super::models::{
    DerivedFeatures, FeatureRow, MatchState, MatchStatus, PredictionResult,
};
use super::validation::{validate, ValidationError};

/// The classifier raised on a live match.
#[derive(Debug, Error)]
#[error("classifier {model} failed: {source}")]
pub struct InferenceFailure {
    pub model: String,
    #[source]
    pub source: InferenceError,
    /// Row that was being scored
    pub row: FeatureRow,
}

/// Why a submission produced no prediction.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid input: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Inference(#[from] InferenceFailure),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of one pass through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub state: MatchState,
    pub features: DerivedFeatures,
    pub status: MatchStatus,
    pub result: PredictionResult,
    /// Row sent to the classifier; `None` when the match was already decided
    pub model_input: Option<FeatureRow>,
}

/// Validates, derives and scores match states against a loaded store.
#[derive(Clone)]
pub struct Predictor {
    store: Arc<ArtifactStore>,
}

impl Predictor {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Predictor { store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Full pipeline for one submission: validate, derive, predict.
    pub fn evaluate(&self, state: &MatchState) -> Result<Prediction, PredictError> {
        let problems = validate(state, self.store.catalog());
        if !problems.is_empty() {
            debug!("Rejected submission with {} problem(s)", problems.len());
            return Err(PredictError::Invalid(problems));
        }
        let features = derive(state);
        Ok(self.predict(state, &features)?)
    }

    /// Score an already-validated state. Decided matches never reach the
    /// classifier.
    pub fn predict(
        &self,
        state: &MatchState,
        features: &DerivedFeatures,
    ) -> Result<Prediction, InferenceFailure> {
        let status = classify(features);

        if let MatchStatus::Decided(reason) = status {
            debug!(
                "{} vs {}: decided ({:?})",
                state.batting_team, state.bowling_team, reason
            );
            return Ok(Prediction {
                state: state.clone(),
                features: *features,
                status,
                result: PredictionResult::decided(reason.winner()),
                model_input: None,
            });
        }

        let row = FeatureRow::new(state, features);
        let classifier = self.store.classifier();
        let [loss, win] = match classifier.predict_proba(&row) {
            Ok(pair) => pair,
            Err(source) => {
                error!("Inference failed for {:?}: {}", row, source);
                return Err(InferenceFailure {
                    model: classifier.name().to_string(),
                    source,
                    row,
                });
            }
        };
        debug!(
            "{} vs {}: win {:.3} / loss {:.3}",
            state.batting_team, state.bowling_team, win, loss
        );

        Ok(Prediction {
            state: state.clone(),
            features: *features,
            status,
            result: PredictionResult {
                win_probability: win,
                loss_probability: loss,
            },
            model_input: Some(row),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{Catalog, WinClassifier};
    use crate::chase::models::DecidedReason;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed win probability and counts calls.
    struct FixedClassifier {
        win: f64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(win: f64) -> Self {
            FixedClassifier {
                win,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl WinClassifier for FixedClassifier {
        fn predict_proba(&self, _row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok([1.0 - self.win, self.win])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingClassifier;

    impl WinClassifier for FailingClassifier {
        fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
            Err(InferenceError::UnknownCategory {
                column: "city".into(),
                value: row.city.clone(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                "Mumbai Indians".to_string(),
                "Chennai Super Kings".to_string(),
                "Rajasthan Royals".to_string(),
            ],
            vec!["Mumbai".to_string(), "Jaipur".to_string()],
        )
    }

    fn predictor_with(classifier: Arc<dyn WinClassifier>) -> Predictor {
        Predictor::new(Arc::new(ArtifactStore::new(catalog(), classifier)))
    }

    fn state(target: i64, score: i64, overs: i64, wickets: i64) -> MatchState {
        MatchState {
            batting_team: "Rajasthan Royals".into(),
            bowling_team: "Mumbai Indians".into(),
            city: "Jaipur".into(),
            target,
            score,
            overs_completed: overs,
            wickets_fallen: wickets,
        }
    }

    #[test]
    fn live_match_invokes_classifier() {
        let fixed = Arc::new(FixedClassifier::new(0.42));
        let predictor = predictor_with(fixed.clone());
        let p = predictor.evaluate(&state(160, 82, 11, 2)).unwrap();

        assert_eq!(p.status, MatchStatus::Live);
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 1);
        assert_relative_eq!(p.result.win_probability, 0.42);
        assert_relative_eq!(
            p.result.win_probability + p.result.loss_probability,
            1.0,
            epsilon = 1e-12
        );
        let row = p.model_input.unwrap();
        assert_eq!(row.target_left, 78);
        assert_eq!(row.remaining_balls, 54);
        assert_eq!(row.wickets, 8);
    }

    #[test]
    fn target_reached_skips_classifier() {
        let fixed = Arc::new(FixedClassifier::new(0.1));
        let predictor = predictor_with(fixed.clone());
        let p = predictor.evaluate(&state(100, 100, 10, 3)).unwrap();

        assert_eq!(
            p.status,
            MatchStatus::Decided(DecidedReason::TargetReached)
        );
        assert_eq!(p.result.win_probability, 1.0);
        assert_eq!(p.result.loss_probability, 0.0);
        assert!(p.model_input.is_none());
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn overs_exhausted_is_a_loss() {
        let fixed = Arc::new(FixedClassifier::new(0.9));
        let predictor = predictor_with(fixed.clone());
        let p = predictor.evaluate(&state(150, 90, 20, 4)).unwrap();

        assert_eq!(p.status, MatchStatus::Decided(DecidedReason::NoBallsLeft));
        assert_eq!(p.result.win_probability, 0.0);
        assert_eq!(p.result.loss_probability, 1.0);
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_out_is_a_loss() {
        let fixed = Arc::new(FixedClassifier::new(0.9));
        let predictor = predictor_with(fixed.clone());
        let p = predictor.evaluate(&state(150, 90, 12, 10)).unwrap();

        assert_eq!(p.status, MatchStatus::Decided(DecidedReason::AllOut));
        assert_eq!(p.result.win_probability, 0.0);
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_state_never_scores() {
        let fixed = Arc::new(FixedClassifier::new(0.5));
        let predictor = predictor_with(fixed.clone());
        let mut s = state(160, 82, 11, 2);
        s.bowling_team = s.batting_team.clone();

        match predictor.evaluate(&s) {
            Err(PredictError::Invalid(problems)) => {
                assert_eq!(problems, vec![ValidationError::SameTeams])
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn classifier_error_is_surfaced() {
        let predictor = predictor_with(Arc::new(FailingClassifier));
        let err = predictor.evaluate(&state(160, 82, 11, 2)).unwrap_err();
        match err {
            PredictError::Inference(failure) => {
                assert_eq!(failure.model, "failing");
                assert_eq!(failure.row.city, "Jaipur");
                assert!(failure.to_string().contains("unseen category"));
            }
            other => panic!("expected inference failure, got {:?}", other),
        }
    }

    #[test]
    fn decided_match_survives_failing_classifier() {
        let predictor = predictor_with(Arc::new(FailingClassifier));
        let p = predictor.evaluate(&state(100, 120, 15, 5)).unwrap();
        assert_eq!(p.result.win_probability, 1.0);
    }
}
