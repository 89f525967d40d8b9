use serde::{Deserialize, Serialize};

/// Balls in a full T20 innings.
pub const BALLS_PER_INNINGS: i64 = 120;
pub const BALLS_PER_OVER: i64 = 6;
pub const MAX_OVERS: i64 = 20;
pub const MAX_WICKETS: i64 = 10;

/// Raw match context for a second-innings chase, as entered on the form.
///
/// Numeric fields are signed so that out-of-range submissions reach the
/// validator instead of failing at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub batting_team: String,
    pub bowling_team: String,
    pub city: String,
    /// Total the batting team needs to reach
    pub target: i64,
    /// Runs scored so far
    pub score: i64,
    /// Completed overs (0–20)
    pub overs_completed: i64,
    /// Wickets fallen (0–10)
    pub wickets_fallen: i64,
}

/// Arithmetic features derived from a [`MatchState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFeatures {
    /// `target - score`; negative once the target has been passed
    pub runs_left: i64,
    pub balls_left: i64,
    pub wickets_left: i64,
    /// Runs per completed over, 0.0 before the first over is done
    pub current_run_rate: f64,
    /// Runs needed per over; `+inf` when no balls remain
    #[serde(serialize_with = "serialize_rate")]
    pub required_run_rate: f64,
}

/// JSON has no infinity, so an unbounded rate goes out as `null`.
fn serialize_rate<S: serde::Serializer>(rate: &f64, s: S) -> Result<S::Ok, S::Error> {
    if rate.is_finite() {
        s.serialize_f64(*rate)
    } else {
        s.serialize_none()
    }
}

/// Which side of the chase an outcome favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Batting,
    Bowling,
}

/// Why a match no longer needs the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedReason {
    TargetReached,
    NoBallsLeft,
    AllOut,
}

impl DecidedReason {
    pub fn winner(self) -> Side {
        match self {
            DecidedReason::TargetReached => Side::Batting,
            DecidedReason::NoBallsLeft | DecidedReason::AllOut => Side::Bowling,
        }
    }

    /// User-facing decision message for this outcome.
    pub fn message(self, state: &MatchState) -> String {
        match self {
            DecidedReason::TargetReached => {
                format!("{} already reached the target.", state.batting_team)
            }
            DecidedReason::NoBallsLeft => {
                format!("No balls left. {} should win.", state.bowling_team)
            }
            DecidedReason::AllOut => format!("All out. {} should win.", state.bowling_team),
        }
    }
}

/// Match classification produced alongside the derived features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum MatchStatus {
    Decided(DecidedReason),
    Live,
}

/// The row handed to the classifier, keyed by the column names the model was
/// trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub batting_team: String,
    pub bowling_team: String,
    pub city: String,
    #[serde(rename = "Score")]
    pub score: i64,
    /// Wickets remaining, not fallen
    #[serde(rename = "Wickets")]
    pub wickets: i64,
    #[serde(rename = "Remaining Balls")]
    pub remaining_balls: i64,
    pub target_left: i64,
    pub crr: f64,
    pub rrr: f64,
}

impl FeatureRow {
    pub fn new(state: &MatchState, features: &DerivedFeatures) -> Self {
        FeatureRow {
            batting_team: state.batting_team.clone(),
            bowling_team: state.bowling_team.clone(),
            city: state.city.clone(),
            score: state.score,
            wickets: features.wickets_left,
            remaining_balls: features.balls_left,
            target_left: features.runs_left,
            crr: features.current_run_rate,
            rrr: features.required_run_rate,
        }
    }

    /// Categorical value for a model column, if the column is categorical.
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "batting_team" => Some(&self.batting_team),
            "bowling_team" => Some(&self.bowling_team),
            "city" => Some(&self.city),
            _ => None,
        }
    }

    /// Numeric value for a model column, if the column is numeric.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "Score" => Some(self.score as f64),
            "Wickets" => Some(self.wickets as f64),
            "Remaining Balls" => Some(self.remaining_balls as f64),
            "target_left" => Some(self.target_left as f64),
            "crr" => Some(self.crr),
            "rrr" => Some(self.rrr),
            _ => None,
        }
    }
}

/// Win/loss probabilities for the batting side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub win_probability: f64,
    pub loss_probability: f64,
}

impl PredictionResult {
    pub fn decided(winner: Side) -> Self {
        match winner {
            Side::Batting => PredictionResult {
                win_probability: 1.0,
                loss_probability: 0.0,
            },
            Side::Bowling => PredictionResult {
                win_probability: 0.0,
                loss_probability: 1.0,
            },
        }
    }
}
