use log::debug;
use std::collections::{HashMap, HashSet};

use crate::entities::*;
use crate::options::{check_question, extend_with_options};
use crate::tally::{never_fails, run_tally, Accumulator, Tally};

// ******** Single choice voting *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SingleVotingDefinition {
    pub question: String,
    pub options: Vec<DecisionOption>,
}

/// One voter picking one option.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SingleVote {
    pub option_id: String,
    pub voter_id: String,
}

impl SingleVote {
    pub fn new(option_id: &str, voter_id: &str) -> SingleVote {
        SingleVote {
            option_id: option_id.to_string(),
            voter_id: voter_id.to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SingleOptionResult {
    pub option_id: String,
    pub n_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SingleErrorCode {
    EmptyQuestion,
    Options(OptionErrorCode),
    DuplicateVote,
    InvalidOption,
}

impl From<OptionErrorCode> for SingleErrorCode {
    fn from(code: OptionErrorCode) -> Self {
        SingleErrorCode::Options(code)
    }
}

impl ShortCode for SingleErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            SingleErrorCode::EmptyQuestion => "empty_question",
            SingleErrorCode::Options(code) => code.as_str(),
            SingleErrorCode::DuplicateVote => "duplicate_vote",
            SingleErrorCode::InvalidOption => "invalid_option",
        }
    }
}

pub type SingleVotingResults = Tally<SingleOptionResult, SingleErrorCode>;

pub fn validate_single_voting_definition(
    definition: &SingleVotingDefinition,
) -> Result<(), DecisionErrors<SingleErrorCode>> {
    let mut errors: DecisionErrors<SingleErrorCode> = Vec::new();
    errors.extend(check_question(
        &definition.question,
        SingleErrorCode::EmptyQuestion,
    ));
    extend_with_options(&mut errors, &definition.options);
    into_validation(errors)
}

/// Checks a single incoming vote before it gets stored.
///
/// Whether the voter already voted is not known here: this is for the storage to
/// tell.
pub fn validate_single_vote(
    definition: &SingleVotingDefinition,
    vote: &SingleVote,
) -> Result<(), DecisionErrors<SingleErrorCode>> {
    let mut errors = Vec::new();
    SingleChecker::new(definition).check_option(vote, &mut errors);
    into_validation(errors)
}

/// Counts the votes for each option.
///
/// The results are sorted by decreasing number of votes. Options with the same
/// number of votes are sorted by id.
///
/// ```
/// use decido_core::*;
///
/// let definition = SingleVotingDefinition {
///     question: "Lunch?".to_string(),
///     options: vec![DecisionOption::new("a", "Pizza"), DecisionOption::new("b", "Sushi")],
/// };
/// let votes = vec![SingleVote::new("b", "anna"), SingleVote::new("b", "bob")];
/// let results = calculate_single_voting_results(&definition, votes).unwrap();
/// assert_eq!(results[0].option_id, "b");
/// assert_eq!(results[0].n_votes, 2);
/// ```
pub fn calculate_single_voting_results<I>(
    definition: &SingleVotingDefinition,
    votes: I,
) -> SingleVotingResults
where
    I: IntoIterator<Item = SingleVote>,
{
    never_fails(try_calculate_single_voting_results(
        definition,
        votes.into_iter().map(Ok),
    ))
}

/// Same as `calculate_single_voting_results`, for a source of votes that may fail.
pub fn try_calculate_single_voting_results<I, E>(
    definition: &SingleVotingDefinition,
    votes: I,
) -> Result<SingleVotingResults, E>
where
    I: IntoIterator<Item = Result<SingleVote, E>>,
{
    run_tally(
        "single_voting",
        validate_single_voting_definition(definition),
        SingleAccumulator::new(definition),
        votes,
    )
}

struct SingleChecker<'a> {
    option_ids: HashSet<&'a str>,
}

impl<'a> SingleChecker<'a> {
    fn new(definition: &'a SingleVotingDefinition) -> SingleChecker<'a> {
        SingleChecker {
            option_ids: definition.options.iter().map(|o| o.id.as_str()).collect(),
        }
    }

    fn check_option(
        &self,
        vote: &SingleVote,
        errors: &mut DecisionErrors<SingleErrorCode>,
    ) -> bool {
        if self.option_ids.contains(vote.option_id.as_str()) {
            true
        } else {
            errors.push(DecisionError::vote(
                SingleErrorCode::InvalidOption,
                format!(
                    "Vote by voter {} has an invalid option ID {}",
                    vote.voter_id, vote.option_id
                ),
            ));
            false
        }
    }
}

struct SingleAccumulator<'a> {
    checker: SingleChecker<'a>,
    voter_ids: HashSet<String>,
    // In the order of the definition.
    counts: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl<'a> SingleAccumulator<'a> {
    fn new(definition: &'a SingleVotingDefinition) -> SingleAccumulator<'a> {
        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for option in definition.options.iter() {
            positions.entry(option.id.clone()).or_insert_with(|| {
                counts.push((option.id.clone(), 0));
                counts.len() - 1
            });
        }
        SingleAccumulator {
            checker: SingleChecker::new(definition),
            voter_ids: HashSet::new(),
            counts,
            positions,
        }
    }
}

impl<'a> Accumulator for SingleAccumulator<'a> {
    type Vote = SingleVote;
    type Code = SingleErrorCode;
    type Output = SingleOptionResult;

    fn accept(&mut self, vote: SingleVote, errors: &mut DecisionErrors<SingleErrorCode>) {
        let mut is_valid = true;
        if !self.voter_ids.insert(vote.voter_id.clone()) {
            errors.push(DecisionError::vote(
                SingleErrorCode::DuplicateVote,
                format!("Voter {} has already voted", vote.voter_id),
            ));
            is_valid = false;
        }
        is_valid &= self.checker.check_option(&vote, errors);
        if is_valid {
            if let Some(idx) = self.positions.get(&vote.option_id) {
                self.counts[*idx].1 += 1;
            }
        } else {
            debug!("single_voting: skipping vote {:?}", vote);
        }
    }

    fn finish(self) -> Vec<SingleOptionResult> {
        let mut counts = self.counts;
        counts.sort_by(|(id1, n1), (id2, n2)| n2.cmp(n1).then_with(|| id1.cmp(id2)));
        counts
            .into_iter()
            .map(|(option_id, n_votes)| SingleOptionResult { option_id, n_votes })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> SingleVotingDefinition {
        SingleVotingDefinition {
            question: "Q".to_string(),
            options: vec![DecisionOption::new("a", "A"), DecisionOption::new("b", "B")],
        }
    }

    fn result(option_id: &str, n_votes: u64) -> SingleOptionResult {
        SingleOptionResult {
            option_id: option_id.to_string(),
            n_votes,
        }
    }

    fn codes<R>(res: Result<R, DecisionErrors<SingleErrorCode>>) -> Vec<SingleErrorCode> {
        match res {
            Ok(_) => panic!("expected errors"),
            Err(errors) => errors.iter().map(|e| e.short_code).collect(),
        }
    }

    #[test]
    fn simple_tally() {
        let votes = vec![
            SingleVote::new("a", "v1"),
            SingleVote::new("b", "v2"),
            SingleVote::new("a", "v3"),
        ];
        assert_eq!(
            calculate_single_voting_results(&definition(), votes),
            Ok(vec![result("a", 2), result("b", 1)])
        );
    }

    #[test]
    fn unanimous_vote() {
        let def = SingleVotingDefinition {
            question: "Q".to_string(),
            options: vec![
                DecisionOption::new("a", "A"),
                DecisionOption::new("b", "B"),
                DecisionOption::new("c", "C"),
            ],
        };
        let votes: Vec<SingleVote> = (0..5)
            .map(|i| SingleVote::new("c", &format!("voter{}", i)))
            .collect();
        assert_eq!(
            calculate_single_voting_results(&def, votes),
            Ok(vec![result("c", 5), result("a", 0), result("b", 0)])
        );
    }

    #[test]
    fn ties_sorted_by_option_id() {
        let def = SingleVotingDefinition {
            question: "Q".to_string(),
            options: vec![DecisionOption::new("z", "Z"), DecisionOption::new("m", "M")],
        };
        let votes = vec![SingleVote::new("z", "v1"), SingleVote::new("m", "v2")];
        assert_eq!(
            calculate_single_voting_results(&def, votes),
            Ok(vec![result("m", 1), result("z", 1)])
        );
    }

    #[test]
    fn no_votes() {
        assert_eq!(
            calculate_single_voting_results(&definition(), vec![]),
            Ok(vec![result("a", 0), result("b", 0)])
        );
    }

    #[test]
    fn invalid_definition_stops_before_votes() {
        let def = SingleVotingDefinition {
            question: " ".to_string(),
            options: vec![DecisionOption::new("a", "A")],
        };
        let mut pulled = 0;
        let votes = std::iter::from_fn(|| {
            pulled += 1;
            None::<SingleVote>
        });
        let res = calculate_single_voting_results(&def, votes);
        assert_eq!(
            codes(res),
            vec![
                SingleErrorCode::EmptyQuestion,
                SingleErrorCode::Options(OptionErrorCode::NotEnoughOptions)
            ]
        );
        assert_eq!(pulled, 0);
    }

    #[test]
    fn all_errors_are_collected() {
        let votes = vec![
            SingleVote::new("a", "v1"),
            SingleVote::new("c", "v2"),
            SingleVote::new("b", "v3"),
            SingleVote::new("x", "v1"),
        ];
        let errors = calculate_single_voting_results(&definition(), votes).unwrap_err();
        assert_eq!(
            errors.iter().map(|e| e.short_code).collect::<Vec<_>>(),
            vec![
                SingleErrorCode::InvalidOption,
                SingleErrorCode::DuplicateVote,
                SingleErrorCode::InvalidOption
            ]
        );
        assert!(errors.iter().all(|e| e.violation_type == ViolationType::Vote));
    }

    #[test]
    fn preflight_checks_option_only() {
        let def = definition();
        assert_eq!(validate_single_vote(&def, &SingleVote::new("a", "v1")), Ok(()));
        assert_eq!(
            codes(validate_single_vote(&def, &SingleVote::new("nope", "v1"))),
            vec![SingleErrorCode::InvalidOption]
        );
    }

    #[test]
    fn source_failure_is_returned() {
        let votes: Vec<Result<SingleVote, String>> = vec![
            Ok(SingleVote::new("a", "v1")),
            Err("disk on fire".to_string()),
            Ok(SingleVote::new("b", "v2")),
        ];
        let res = try_calculate_single_voting_results(&definition(), votes);
        assert_eq!(res, Err("disk on fire".to_string()));
    }

    #[test]
    fn recomputing_gives_the_same_result() {
        let votes = vec![
            SingleVote::new("b", "v1"),
            SingleVote::new("a", "v2"),
            SingleVote::new("b", "v3"),
        ];
        let def = definition();
        let first = calculate_single_voting_results(&def, votes.clone());
        let second = calculate_single_voting_results(&def, votes);
        assert_eq!(first, second);
    }
}
