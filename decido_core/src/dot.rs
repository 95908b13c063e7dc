use log::debug;
use std::collections::{HashMap, HashSet};

use crate::entities::*;
use crate::options::extend_with_options;
use crate::tally::{never_fails, run_tally, Accumulator, Tally};

// ******** Dot voting *********

/// A decision in which every participant distributes a number of dots between the
/// options.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotVotingDefinition {
    pub question: String,
    pub options: Vec<DecisionOption>,
    /// The maximum number of dots a participant may distribute. Must be at least 1.
    pub n_dots_per_participant: i64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotAssignment {
    pub option_id: String,
    pub dots: i64,
}

impl DotAssignment {
    pub fn new(option_id: &str, dots: i64) -> DotAssignment {
        DotAssignment {
            option_id: option_id.to_string(),
            dots,
        }
    }
}

/// The dots placed by one voter, before they get stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotBallot {
    pub voter_id: String,
    pub dots_assignment: Vec<DotAssignment>,
}

impl DotBallot {
    pub fn new(voter_id: &str, dots_assignment: &[(&str, i64)]) -> DotBallot {
        DotBallot {
            voter_id: voter_id.to_string(),
            dots_assignment: dots_assignment
                .iter()
                .map(|(option_id, dots)| DotAssignment::new(option_id, *dots))
                .collect(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotVote {
    pub id: String,
    pub ballot: DotBallot,
}

impl DotVote {
    pub fn new(id: &str, voter_id: &str, dots_assignment: &[(&str, i64)]) -> DotVote {
        DotVote {
            id: id.to_string(),
            ballot: DotBallot::new(voter_id, dots_assignment),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotOptionResult {
    pub option_id: String,
    pub n_dots: i64,
    pub n_voters: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum DotErrorCode {
    /// The definition allows less than one dot per participant.
    InvalidDotsPerParticipant,
    Options(OptionErrorCode),
    DuplicateVoteId,
    InvalidOption,
    /// An assignment with less than one dot.
    InvalidDotsNumber,
    NoDotsAssigned,
    ExceedsDotsLimitInVote,
    InvalidVoterId,
}

impl From<OptionErrorCode> for DotErrorCode {
    fn from(code: OptionErrorCode) -> Self {
        DotErrorCode::Options(code)
    }
}

impl ShortCode for DotErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            DotErrorCode::InvalidDotsPerParticipant => "invalid_dots_number",
            DotErrorCode::Options(code) => code.as_str(),
            DotErrorCode::DuplicateVoteId => "duplicate_vote_id",
            DotErrorCode::InvalidOption => "invalid_option",
            DotErrorCode::InvalidDotsNumber => "invalid_dots_number",
            DotErrorCode::NoDotsAssigned => "no_dots_assigned",
            DotErrorCode::ExceedsDotsLimitInVote => "exceeds_dots_limit_in_vote",
            DotErrorCode::InvalidVoterId => "invalid_voter_id",
        }
    }
}

pub type DotVotingResults = Tally<DotOptionResult, DotErrorCode>;

pub fn validate_dot_voting_definition(
    definition: &DotVotingDefinition,
) -> Result<(), DecisionErrors<DotErrorCode>> {
    let mut errors: DecisionErrors<DotErrorCode> = Vec::new();
    if definition.n_dots_per_participant < 1 {
        errors.push(DecisionError::definition(
            DotErrorCode::InvalidDotsPerParticipant,
            "The number of dots must be at least 1",
        ));
    }
    extend_with_options(&mut errors, &definition.options);
    into_validation(errors)
}

/// Checks the dots of a voter before they get stored.
///
/// ```
/// use decido_core::*;
///
/// let definition = DotVotingDefinition {
///     question: "Next feature?".to_string(),
///     options: vec![DecisionOption::new("x", "Dark mode"), DecisionOption::new("y", "Export")],
///     n_dots_per_participant: 3,
/// };
/// assert!(validate_dot_vote(&definition, &DotBallot::new("anna", &[("x", 2), ("y", 1)])).is_ok());
///
/// let errors = validate_dot_vote(&definition, &DotBallot::new("bob", &[("x", 4)])).unwrap_err();
/// assert_eq!(errors[0].short_code, DotErrorCode::ExceedsDotsLimitInVote);
/// ```
pub fn validate_dot_vote(
    definition: &DotVotingDefinition,
    ballot: &DotBallot,
) -> Result<(), DecisionErrors<DotErrorCode>> {
    let mut errors = Vec::new();
    let label = format!("Vote by {}", ballot.voter_id);
    DotChecker::new(definition).check_assignment(&label, ballot, &mut errors);
    into_validation(errors)
}

/// Sums the dots and counts the voters of each option.
///
/// The results are sorted by decreasing number of dots, then by decreasing number
/// of voters.
pub fn calculate_dot_voting_results<I>(
    definition: &DotVotingDefinition,
    votes: I,
) -> DotVotingResults
where
    I: IntoIterator<Item = DotVote>,
{
    never_fails(try_calculate_dot_voting_results(
        definition,
        votes.into_iter().map(Ok),
    ))
}

/// Same as `calculate_dot_voting_results`, for a source of votes that may fail.
pub fn try_calculate_dot_voting_results<I, E>(
    definition: &DotVotingDefinition,
    votes: I,
) -> Result<DotVotingResults, E>
where
    I: IntoIterator<Item = Result<DotVote, E>>,
{
    run_tally(
        "dot_voting",
        validate_dot_voting_definition(definition),
        DotAccumulator::new(definition),
        votes,
    )
}

struct DotChecker<'a> {
    option_ids: HashSet<&'a str>,
    n_dots_per_participant: i64,
}

impl<'a> DotChecker<'a> {
    fn new(definition: &'a DotVotingDefinition) -> DotChecker<'a> {
        DotChecker {
            option_ids: definition.options.iter().map(|o| o.id.as_str()).collect(),
            n_dots_per_participant: definition.n_dots_per_participant,
        }
    }

    fn check_assignment(
        &self,
        label: &str,
        ballot: &DotBallot,
        errors: &mut DecisionErrors<DotErrorCode>,
    ) {
        // Wide enough for any number of i64 entries a ballot can hold.
        let mut total_dots: i128 = 0;
        for assignment in ballot.dots_assignment.iter() {
            if !self.option_ids.contains(assignment.option_id.as_str()) {
                errors.push(DecisionError::vote(
                    DotErrorCode::InvalidOption,
                    format!(
                        "{}: dots for option {} which is not a valid option",
                        label, assignment.option_id
                    ),
                ));
            }
            if assignment.dots < 1 {
                errors.push(DecisionError::vote(
                    DotErrorCode::InvalidDotsNumber,
                    format!(
                        "{}: invalid number of dots ({}) for option {}",
                        label, assignment.dots, assignment.option_id
                    ),
                ));
            } else {
                total_dots += i128::from(assignment.dots);
            }
        }
        if total_dots < 1 {
            errors.push(DecisionError::vote(
                DotErrorCode::NoDotsAssigned,
                format!("{} has no dots assigned", label),
            ));
        }
        if total_dots > i128::from(self.n_dots_per_participant) {
            errors.push(DecisionError::vote(
                DotErrorCode::ExceedsDotsLimitInVote,
                format!(
                    "{} exceeds the allowed number of dots ({})",
                    label, self.n_dots_per_participant
                ),
            ));
        }
        if is_blank(&ballot.voter_id) {
            errors.push(DecisionError::vote(
                DotErrorCode::InvalidVoterId,
                format!("{} has an invalid voter ID: {:?}", label, ballot.voter_id),
            ));
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct DotTotals {
    n_dots: i64,
    n_voters: u64,
}

struct DotAccumulator<'a> {
    checker: DotChecker<'a>,
    // In the order of the definition
    option_ids: Vec<&'a str>,
    vote_ids: HashSet<String>,
    totals: HashMap<String, DotTotals>,
}

impl<'a> DotAccumulator<'a> {
    fn new(definition: &'a DotVotingDefinition) -> DotAccumulator<'a> {
        DotAccumulator {
            checker: DotChecker::new(definition),
            option_ids: definition.options.iter().map(|o| o.id.as_str()).collect(),
            vote_ids: HashSet::new(),
            totals: HashMap::new(),
        }
    }
}

impl<'a> Accumulator for DotAccumulator<'a> {
    type Vote = DotVote;
    type Code = DotErrorCode;
    type Output = DotOptionResult;

    fn accept(&mut self, vote: DotVote, errors: &mut DecisionErrors<DotErrorCode>) {
        let label = format!("Vote {}", vote.id);
        if !self.vote_ids.insert(vote.id.clone()) {
            errors.push(DecisionError::vote(
                DotErrorCode::DuplicateVoteId,
                format!("{} is a duplicate", label),
            ));
        }
        self.checker.check_assignment(&label, &vote.ballot, errors);

        // Every entry is counted as it is read, whether or not the vote turns out to
        // be valid. Only a tally without any invalid vote gets reported.
        for assignment in vote.ballot.dots_assignment {
            debug!(
                "dot_voting: {}: {} dots for {}",
                label, assignment.dots, assignment.option_id
            );
            let totals = self.totals.entry(assignment.option_id).or_default();
            totals.n_dots = totals.n_dots.saturating_add(assignment.dots);
            totals.n_voters += 1;
        }
    }

    fn finish(self) -> Vec<DotOptionResult> {
        let totals = self.totals;
        let mut res: Vec<DotOptionResult> = self
            .option_ids
            .iter()
            .map(|id| {
                let t = totals.get(*id).cloned().unwrap_or_default();
                DotOptionResult {
                    option_id: id.to_string(),
                    n_dots: t.n_dots,
                    n_voters: t.n_voters,
                }
            })
            .collect();
        res.sort_by(|r1, r2| {
            r2.n_dots
                .cmp(&r1.n_dots)
                .then_with(|| r2.n_voters.cmp(&r1.n_voters))
        });
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(n_dots_per_participant: i64) -> DotVotingDefinition {
        DotVotingDefinition {
            question: "Where to?".to_string(),
            options: vec![DecisionOption::new("x", "X"), DecisionOption::new("y", "Y")],
            n_dots_per_participant,
        }
    }

    fn result(option_id: &str, n_dots: i64, n_voters: u64) -> DotOptionResult {
        DotOptionResult {
            option_id: option_id.to_string(),
            n_dots,
            n_voters,
        }
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn codes(errors: &DecisionErrors<DotErrorCode>) -> Vec<DotErrorCode> {
        errors.iter().map(|e| e.short_code).collect()
    }

    #[test]
    fn single_vote() {
        let votes = vec![DotVote::new("1", "v1", &[("x", 2), ("y", 1)])];
        assert_eq!(
            calculate_dot_voting_results(&definition(3), votes),
            Ok(vec![result("x", 2, 1), result("y", 1, 1)])
        );
    }

    #[test]
    fn ties_broken_by_voters() {
        let def = DotVotingDefinition {
            question: "Q".to_string(),
            options: vec![
                DecisionOption::new("x", "X"),
                DecisionOption::new("y", "Y"),
                DecisionOption::new("z", "Z"),
            ],
            n_dots_per_participant: 4,
        };
        let votes = vec![
            DotVote::new("1", "v1", &[("x", 4)]),
            DotVote::new("2", "v2", &[("y", 2), ("x", 1)]),
            DotVote::new("3", "v3", &[("y", 2)]),
        ];
        assert_eq!(
            calculate_dot_voting_results(&def, votes),
            Ok(vec![
                result("x", 5, 2),
                result("y", 4, 2),
                result("z", 0, 0)
            ])
        );

        let votes = vec![
            DotVote::new("1", "v1", &[("x", 2)]),
            DotVote::new("2", "v2", &[("y", 1)]),
            DotVote::new("3", "v3", &[("y", 1)]),
        ];
        assert_eq!(
            calculate_dot_voting_results(&def, votes),
            Ok(vec![
                result("y", 2, 2),
                result("x", 2, 1),
                result("z", 0, 0)
            ])
        );
    }

    #[test]
    fn exceeding_the_limit_rejects_the_tally() {
        init_logger();
        let votes = vec![
            DotVote::new("1", "v1", &[("x", 1)]),
            DotVote::new("2", "v2", &[("x", 3), ("y", 1)]),
        ];
        let errors = calculate_dot_voting_results(&definition(3), votes).unwrap_err();
        assert_eq!(codes(&errors), vec![DotErrorCode::ExceedsDotsLimitInVote]);
        assert!(errors[0].message.starts_with("Vote 2"));
    }

    #[test]
    fn all_vote_violations() {
        init_logger();
        let votes = vec![
            DotVote::new("1", "v1", &[("x", 1)]),
            DotVote::new("1", "", &[("w", 1), ("y", 0)]),
            DotVote::new("3", "v3", &[]),
        ];
        let errors = calculate_dot_voting_results(&definition(3), votes).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                DotErrorCode::DuplicateVoteId,
                DotErrorCode::InvalidOption,
                DotErrorCode::InvalidDotsNumber,
                DotErrorCode::InvalidVoterId,
                DotErrorCode::NoDotsAssigned,
            ]
        );
        assert!(errors.iter().all(|e| e.violation_type == ViolationType::Vote));
    }

    #[test]
    fn invalid_definition() {
        let def = DotVotingDefinition {
            question: "".to_string(),
            options: vec![DecisionOption::new("x", "X")],
            n_dots_per_participant: 0,
        };
        let errors = calculate_dot_voting_results(&def, vec![]).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                DotErrorCode::InvalidDotsPerParticipant,
                DotErrorCode::Options(OptionErrorCode::NotEnoughOptions)
            ]
        );
        assert_eq!(errors[0].short_code.as_str(), "invalid_dots_number");
        assert_eq!(errors[0].violation_type, ViolationType::Definition);
    }

    #[test]
    fn preflight() {
        let def = definition(2);
        assert_eq!(
            validate_dot_vote(&def, &DotBallot::new("v1", &[("x", 1), ("y", 1)])),
            Ok(())
        );
        let errors = validate_dot_vote(&def, &DotBallot::new(" ", &[("x", -1)])).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                DotErrorCode::InvalidDotsNumber,
                DotErrorCode::NoDotsAssigned,
                DotErrorCode::InvalidVoterId
            ]
        );
    }

    #[test]
    fn huge_numbers_of_dots() {
        let ballot = DotBallot::new("anna", &[("x", i64::MAX), ("y", 1)]);
        let errors = validate_dot_vote(&definition(3), &ballot).unwrap_err();
        assert_eq!(codes(&errors), vec![DotErrorCode::ExceedsDotsLimitInVote]);

        let votes = vec![DotVote::new("1", "anna", &[("x", i64::MAX), ("y", 1)])];
        let errors = calculate_dot_voting_results(&definition(3), votes).unwrap_err();
        assert_eq!(codes(&errors), vec![DotErrorCode::ExceedsDotsLimitInVote]);

        // Valid votes whose sum does not fit: the total stays at the maximum.
        let votes = vec![
            DotVote::new("1", "anna", &[("x", i64::MAX)]),
            DotVote::new("2", "bob", &[("x", i64::MAX)]),
        ];
        assert_eq!(
            calculate_dot_voting_results(&definition(i64::MAX), votes),
            Ok(vec![result("x", i64::MAX, 2), result("y", 0, 0)])
        );
    }

    #[test]
    fn stopping_the_source_early() {
        let votes = vec![
            DotVote::new("1", "v1", &[("y", 1)]),
            DotVote::new("2", "v2", &[("x", 9)]),
        ];
        assert_eq!(
            calculate_dot_voting_results(&definition(3), votes.into_iter().take(1)),
            Ok(vec![result("y", 1, 1), result("x", 0, 0)])
        );
    }
}
