//! Closed-form chase arithmetic.
//!
//! Everything here is total: the two divisions that could fault are mapped
//! explicitly (no overs bowled gives a CRR of 0.0, no balls left gives an
//! infinite RRR).

use super::models::{
    DecidedReason, DerivedFeatures, MatchState, MatchStatus, BALLS_PER_INNINGS, BALLS_PER_OVER,
    MAX_WICKETS,
};

/// Derive the run/ball/wicket features for a match state.
pub fn derive(state: &MatchState) -> DerivedFeatures {
    let runs_left = state.target - state.score;
    let balls_left = BALLS_PER_INNINGS - state.overs_completed * BALLS_PER_OVER;
    let wickets_left = MAX_WICKETS - state.wickets_fallen;

    let current_run_rate = if state.overs_completed > 0 {
        state.score as f64 / state.overs_completed as f64
    } else {
        0.0
    };
    let required_run_rate = if balls_left > 0 {
        (runs_left * BALLS_PER_OVER) as f64 / balls_left as f64
    } else {
        f64::INFINITY
    };

    DerivedFeatures {
        runs_left,
        balls_left,
        wickets_left,
        current_run_rate,
        required_run_rate,
    }
}

/// Classify the match as decided or live.
///
/// Target reached is checked first: a chase completed off the last ball or
/// by the last pair still counts as a batting win.
pub fn classify(features: &DerivedFeatures) -> MatchStatus {
    if features.runs_left <= 0 {
        MatchStatus::Decided(DecidedReason::TargetReached)
    } else if features.balls_left <= 0 {
        MatchStatus::Decided(DecidedReason::NoBallsLeft)
    } else if features.wickets_left <= 0 {
        MatchStatus::Decided(DecidedReason::AllOut)
    } else {
        MatchStatus::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state(target: i64, score: i64, overs: i64, wickets: i64) -> MatchState {
        MatchState {
            batting_team: "Royal Challengers Bangalore".into(),
            bowling_team: "Kolkata Knight Riders".into(),
            city: "Bangalore".into(),
            target,
            score,
            overs_completed: overs,
            wickets_fallen: wickets,
        }
    }

    #[test]
    fn mid_chase_features() {
        let f = derive(&state(160, 82, 11, 2));
        assert_eq!(f.runs_left, 78);
        assert_eq!(f.balls_left, 54);
        assert_eq!(f.wickets_left, 8);
        assert_relative_eq!(f.current_run_rate, 7.4545, epsilon = 1e-3);
        assert_relative_eq!(f.required_run_rate, 8.6667, epsilon = 1e-3);
        assert_eq!(classify(&f), MatchStatus::Live);
    }

    #[test]
    fn crr_is_zero_before_first_over() {
        let f = derive(&state(150, 0, 0, 0));
        assert_eq!(f.current_run_rate, 0.0);
        let f = derive(&state(150, 12, 0, 0));
        assert_eq!(f.current_run_rate, 0.0);
    }

    #[test]
    fn rrr_is_infinite_without_balls() {
        let f = derive(&state(150, 90, 20, 4));
        assert_eq!(f.balls_left, 0);
        assert!(f.required_run_rate.is_infinite() && f.required_run_rate > 0.0);
    }

    #[test]
    fn rrr_can_go_negative_after_target_passed() {
        let f = derive(&state(100, 106, 10, 3));
        assert_eq!(f.runs_left, -6);
        assert_relative_eq!(f.required_run_rate, -0.6, epsilon = 1e-12);
    }

    #[test]
    fn target_reached_is_decided_for_batting() {
        let f = derive(&state(100, 100, 10, 3));
        assert_eq!(f.runs_left, 0);
        assert_eq!(
            classify(&f),
            MatchStatus::Decided(DecidedReason::TargetReached)
        );
    }

    #[test]
    fn no_balls_left_is_decided_for_bowling() {
        let f = derive(&state(150, 90, 20, 4));
        assert_eq!(classify(&f), MatchStatus::Decided(DecidedReason::NoBallsLeft));
    }

    #[test]
    fn all_out_is_decided_for_bowling() {
        let f = derive(&state(150, 90, 12, 10));
        assert_eq!(f.wickets_left, 0);
        assert_eq!(classify(&f), MatchStatus::Decided(DecidedReason::AllOut));
    }

    #[test]
    fn target_reached_beats_last_ball_and_last_wicket() {
        let f = derive(&state(150, 151, 20, 10));
        assert_eq!(
            classify(&f),
            MatchStatus::Decided(DecidedReason::TargetReached)
        );
    }

    #[test]
    fn balls_exhausted_beats_all_out() {
        let f = derive(&state(150, 120, 20, 10));
        assert_eq!(classify(&f), MatchStatus::Decided(DecidedReason::NoBallsLeft));
    }
}
