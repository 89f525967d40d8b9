use thiserror::Error;

use crate::artifacts::Catalog;

use super::models::{MatchState, MAX_OVERS, MAX_WICKETS};

/// Upper bound the entry form places on target and score.
pub const MAX_RUNS: i64 = 500;

/// A domain rule violated by a submitted [`MatchState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Batting and bowling teams must be different.")]
    SameTeams,
    #[error("Overs completed cannot exceed 20.")]
    TooManyOvers,
    #[error("Wickets fallen cannot exceed 10.")]
    TooManyWickets,
    #[error("Target and score must be non-negative.")]
    NegativeRuns,
    #[error("Target and score cannot exceed 500.")]
    TooManyRuns,
    #[error("Overs and wickets must be non-negative.")]
    NegativeProgress,
    #[error("Unknown team: {0}.")]
    UnknownTeam(String),
    #[error("Unknown city: {0}.")]
    UnknownCity(String),
}

/// Check every rule and return all violations. An empty list means the state
/// can go to the predictor unchanged.
pub fn validate(state: &MatchState, catalog: &Catalog) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    if state.batting_team == state.bowling_team {
        problems.push(ValidationError::SameTeams);
    }
    if state.overs_completed > MAX_OVERS {
        problems.push(ValidationError::TooManyOvers);
    }
    if state.wickets_fallen > MAX_WICKETS {
        problems.push(ValidationError::TooManyWickets);
    }
    if state.target < 0 || state.score < 0 {
        problems.push(ValidationError::NegativeRuns);
    }
    if state.target > MAX_RUNS || state.score > MAX_RUNS {
        problems.push(ValidationError::TooManyRuns);
    }
    if state.overs_completed < 0 || state.wickets_fallen < 0 {
        problems.push(ValidationError::NegativeProgress);
    }

    if !catalog.has_team(&state.batting_team) {
        problems.push(ValidationError::UnknownTeam(state.batting_team.clone()));
    }
    // Same unknown name on both sides is reported once.
    if state.bowling_team != state.batting_team && !catalog.has_team(&state.bowling_team) {
        problems.push(ValidationError::UnknownTeam(state.bowling_team.clone()));
    }
    if !catalog.has_city(&state.city) {
        problems.push(ValidationError::UnknownCity(state.city.clone()));
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                "Mumbai Indians".to_string(),
                "Chennai Super Kings".to_string(),
                "Delhi Capitals".to_string(),
            ],
            vec!["Mumbai".to_string(), "Chennai".to_string()],
        )
    }

    fn state() -> MatchState {
        MatchState {
            batting_team: "Chennai Super Kings".into(),
            bowling_team: "Mumbai Indians".into(),
            city: "Mumbai".into(),
            target: 160,
            score: 82,
            overs_completed: 11,
            wickets_fallen: 2,
        }
    }

    #[test]
    fn accepts_valid_state() {
        assert!(validate(&state(), &catalog()).is_empty());
    }

    #[test]
    fn identical_known_teams_only_fail_the_distinct_rule() {
        let mut s = state();
        s.batting_team = "Mumbai Indians".into();
        s.bowling_team = "Mumbai Indians".into();
        assert_eq!(validate(&s, &catalog()), vec![ValidationError::SameTeams]);
    }

    #[test]
    fn overs_boundary() {
        let mut s = state();
        s.overs_completed = 20;
        assert!(validate(&s, &catalog()).is_empty());
        s.overs_completed = 21;
        assert_eq!(validate(&s, &catalog()), vec![ValidationError::TooManyOvers]);
    }

    #[test]
    fn wickets_boundary() {
        let mut s = state();
        s.wickets_fallen = 10;
        assert!(validate(&s, &catalog()).is_empty());
        s.wickets_fallen = 11;
        assert_eq!(
            validate(&s, &catalog()),
            vec![ValidationError::TooManyWickets]
        );
    }

    #[test]
    fn collects_every_violation() {
        let s = MatchState {
            batting_team: "Delhi Capitals".into(),
            bowling_team: "Delhi Capitals".into(),
            city: "Hyderabad".into(),
            target: -1,
            score: 40,
            overs_completed: 25,
            wickets_fallen: 12,
        };
        let problems = validate(&s, &catalog());
        assert_eq!(
            problems,
            vec![
                ValidationError::SameTeams,
                ValidationError::TooManyOvers,
                ValidationError::TooManyWickets,
                ValidationError::NegativeRuns,
                ValidationError::UnknownCity("Hyderabad".into()),
            ]
        );
    }

    #[test]
    fn unknown_teams_and_negative_progress() {
        let mut s = state();
        s.batting_team = "Deccan Chargers".into();
        s.bowling_team = "Kochi Tuskers Kerala".into();
        s.overs_completed = -1;
        let problems = validate(&s, &catalog());
        assert_eq!(
            problems,
            vec![
                ValidationError::NegativeProgress,
                ValidationError::UnknownTeam("Deccan Chargers".into()),
                ValidationError::UnknownTeam("Kochi Tuskers Kerala".into()),
            ]
        );
    }

    #[test]
    fn runs_above_form_limit_rejected() {
        let mut s = state();
        s.target = 501;
        assert_eq!(validate(&s, &catalog()), vec![ValidationError::TooManyRuns]);
    }

    #[test]
    fn messages_match_form_wording() {
        assert_eq!(
            ValidationError::SameTeams.to_string(),
            "Batting and bowling teams must be different."
        );
        assert_eq!(
            ValidationError::TooManyOvers.to_string(),
            "Overs completed cannot exceed 20."
        );
        assert_eq!(
            ValidationError::TooManyWickets.to_string(),
            "Wickets fallen cannot exceed 10."
        );
        assert_eq!(
            ValidationError::UnknownCity("Pune".into()).to_string(),
            "Unknown city: Pune."
        );
    }
}
