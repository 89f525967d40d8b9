//! Display values for a finished prediction.
//!
//! Nothing here changes the prediction; it only clamps, rounds and labels.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::models::{FeatureRow, MatchStatus};
use super::predictor::Prediction;

/// Win percentage at or above which the chase is "on course".
pub const ON_COURSE_PCT: f64 = 65.0;
/// Win percentage at or below which the bowlers are "on top".
pub const ON_TOP_PCT: f64 = 35.0;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub tone: Tone,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub runs_required: i64,
    pub balls_left: i64,
    pub wickets_in_hand: i64,
    pub crr: String,
    pub rrr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityBar {
    pub team: String,
    /// Percentage rounded to one decimal
    pub percent: f64,
}

/// Everything the form shows after a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kpis: Kpis,
    pub batting: ProbabilityBar,
    pub bowling: ProbabilityBar,
    pub verdict: Verdict,
    pub decided: bool,
    /// Debug view of the classifier input
    pub model_input: Option<FeatureRow>,
    pub computed_at: DateTime<Utc>,
}

/// Convert to a percentage rounded to one decimal place. Exact halves go to
/// the even digit, so 1.25% shows as 1.2%.
pub fn round_pct(probability: f64) -> f64 {
    (probability * 100.0 * 10.0).round_ties_even() / 10.0
}

pub fn format_rate(rate: f64) -> String {
    if rate.is_infinite() && rate > 0.0 {
        "∞".to_string()
    } else {
        format!("{:.2}", rate)
    }
}

fn verdict(prediction: &Prediction, win_pct: f64) -> Verdict {
    let state = &prediction.state;
    match prediction.status {
        MatchStatus::Decided(reason) => Verdict {
            tone: Tone::Success,
            message: reason.message(state),
        },
        MatchStatus::Live if win_pct >= ON_COURSE_PCT => Verdict {
            tone: Tone::Success,
            message: format!("{} are well on course.", state.batting_team),
        },
        MatchStatus::Live if win_pct <= ON_TOP_PCT => Verdict {
            tone: Tone::Error,
            message: format!("{} on top; chase getting tough.", state.bowling_team),
        },
        MatchStatus::Live => Verdict {
            tone: Tone::Info,
            message: "Tight contest, this could go either way!".to_string(),
        },
    }
}

pub fn render(prediction: &Prediction) -> Report {
    let features = &prediction.features;
    let win_pct = round_pct(prediction.result.win_probability);
    let loss_pct = round_pct(prediction.result.loss_probability);

    Report {
        kpis: Kpis {
            runs_required: features.runs_left.max(0),
            balls_left: features.balls_left.max(0),
            wickets_in_hand: features.wickets_left.max(0),
            crr: format_rate(features.current_run_rate),
            rrr: format_rate(features.required_run_rate),
        },
        batting: ProbabilityBar {
            team: prediction.state.batting_team.clone(),
            percent: win_pct,
        },
        bowling: ProbabilityBar {
            team: prediction.state.bowling_team.clone(),
            percent: loss_pct,
        },
        verdict: verdict(prediction, win_pct),
        decided: matches!(prediction.status, MatchStatus::Decided(_)),
        model_input: prediction.model_input.clone(),
        computed_at: Utc::now(),
    }
}

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Runs required: {}   Balls left: {}   Wickets in hand: {}",
            self.kpis.runs_required, self.kpis.balls_left, self.kpis.wickets_in_hand
        )?;
        writeln!(f, "CRR {}   RRR {}", self.kpis.crr, self.kpis.rrr)?;
        writeln!(f)?;
        for side in [&self.batting, &self.bowling] {
            writeln!(f, "{} win probability", side.team)?;
            writeln!(f, "  {} {:.1}%", bar(side.percent), side.percent)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.verdict.message)
    }
}
