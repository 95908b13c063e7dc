use log::debug;
use std::collections::{HashMap, HashSet};

use crate::entities::*;
use crate::options::{check_question, extend_with_options};
use crate::tally::{never_fails, run_tally, Accumulator, Tally};

// ******** Ranked choice voting *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedVotingDefinition {
    pub question: String,
    pub options: Vec<DecisionOption>,
}

/// The ranking submitted by a voter, before it is stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedBallot {
    pub voter_id: String,
    /// The first option is the most preferred one.
    pub options_ids_ranked: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedVote {
    pub id: String,
    pub ballot: RankedBallot,
}

impl RankedVote {
    pub fn new(id: &str, voter_id: &str, options_ids_ranked: &[&str]) -> RankedVote {
        RankedVote {
            id: id.to_string(),
            ballot: RankedBallot {
                voter_id: voter_id.to_string(),
                options_ids_ranked: options_ids_ranked.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedOptionResult {
    pub option_id: String,
    /// The sum of the positions (starting at 1) of this option in all the votes.
    /// Lower is better.
    pub total_rank_score: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RankedErrorCode {
    EmptyQuestion,
    Options(OptionErrorCode),
    DuplicateVoteId,
    InvalidOptionId,
    DuplicateOptionInVote,
    MissingOptionsInVote,
    InvalidVoterId,
}

impl From<OptionErrorCode> for RankedErrorCode {
    fn from(code: OptionErrorCode) -> Self {
        RankedErrorCode::Options(code)
    }
}

impl ShortCode for RankedErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            RankedErrorCode::EmptyQuestion => "empty_question",
            RankedErrorCode::Options(code) => code.as_str(),
            RankedErrorCode::DuplicateVoteId => "duplicate_vote_id",
            RankedErrorCode::InvalidOptionId => "invalid_option_id",
            RankedErrorCode::DuplicateOptionInVote => "duplicate_option_in_vote",
            RankedErrorCode::MissingOptionsInVote => "missing_options_in_vote",
            RankedErrorCode::InvalidVoterId => "invalid_voter_id",
        }
    }
}

pub type RankedVotingResults = Tally<RankedOptionResult, RankedErrorCode>;

pub fn validate_ranked_voting_definition(
    definition: &RankedVotingDefinition,
) -> Result<(), DecisionErrors<RankedErrorCode>> {
    let mut errors: DecisionErrors<RankedErrorCode> = Vec::new();
    errors.extend(check_question(
        &definition.question,
        RankedErrorCode::EmptyQuestion,
    ));
    extend_with_options(&mut errors, &definition.options);
    into_validation(errors)
}

/// Checks a ranking before it gets stored: every option must be ranked exactly once.
pub fn validate_ranked_vote(
    definition: &RankedVotingDefinition,
    ballot: &RankedBallot,
) -> Result<(), DecisionErrors<RankedErrorCode>> {
    let mut errors = Vec::new();
    let label = format!("Vote by {}", ballot.voter_id);
    RankedChecker::new(definition).check_ranking(&label, ballot, &mut errors);
    into_validation(errors)
}

/// Sums the positions of each option over all the rankings (Borda count, lower is
/// better).
///
/// Every vote must rank all the options. The results are sorted by increasing
/// score, options with the same score keep the order of the definition.
pub fn calculate_ranked_voting_results<I>(
    definition: &RankedVotingDefinition,
    votes: I,
) -> RankedVotingResults
where
    I: IntoIterator<Item = RankedVote>,
{
    never_fails(try_calculate_ranked_voting_results(
        definition,
        votes.into_iter().map(Ok),
    ))
}

/// Same as `calculate_ranked_voting_results`, for a source of votes that may fail.
pub fn try_calculate_ranked_voting_results<I, E>(
    definition: &RankedVotingDefinition,
    votes: I,
) -> Result<RankedVotingResults, E>
where
    I: IntoIterator<Item = Result<RankedVote, E>>,
{
    run_tally(
        "ranked_voting",
        validate_ranked_voting_definition(definition),
        RankedAccumulator::new(definition),
        votes,
    )
}

struct RankedChecker<'a> {
    // In the order of the definition
    option_ids: Vec<&'a str>,
    valid_ids: HashSet<&'a str>,
}

impl<'a> RankedChecker<'a> {
    fn new(definition: &'a RankedVotingDefinition) -> RankedChecker<'a> {
        let option_ids: Vec<&'a str> = definition.options.iter().map(|o| o.id.as_str()).collect();
        RankedChecker {
            valid_ids: option_ids.iter().cloned().collect(),
            option_ids,
        }
    }

    /// Returns the scored entries of the ranking, recording its violations.
    ///
    /// Unknown options and repeated options do not get a score.
    fn check_ranking<'b>(
        &self,
        label: &str,
        ballot: &'b RankedBallot,
        errors: &mut DecisionErrors<RankedErrorCode>,
    ) -> Vec<(&'b str, u64)> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut scores: Vec<(&'b str, u64)> = Vec::new();
        for (rank_idx, option_id) in ballot.options_ids_ranked.iter().enumerate() {
            if !self.valid_ids.contains(option_id.as_str()) {
                errors.push(DecisionError::vote(
                    RankedErrorCode::InvalidOptionId,
                    format!("{} contains invalid option ID: {}", label, option_id),
                ));
                continue;
            }
            if !seen.insert(option_id.as_str()) {
                errors.push(DecisionError::vote(
                    RankedErrorCode::DuplicateOptionInVote,
                    format!("{} contains duplicate option ID: {}", label, option_id),
                ));
                continue;
            }
            scores.push((option_id.as_str(), rank_idx as u64 + 1));
        }

        if seen.len() < self.valid_ids.len() {
            let missing: Vec<&str> = self
                .option_ids
                .iter()
                .filter(|id| !seen.contains(**id))
                .cloned()
                .collect();
            errors.push(DecisionError::vote(
                RankedErrorCode::MissingOptionsInVote,
                format!("{} is missing options: {}", label, missing.join(", ")),
            ));
        }

        if is_blank(&ballot.voter_id) {
            errors.push(DecisionError::vote(
                RankedErrorCode::InvalidVoterId,
                format!("{} has an invalid voter ID: {:?}", label, ballot.voter_id),
            ));
        }
        scores
    }
}

struct RankedAccumulator<'a> {
    checker: RankedChecker<'a>,
    vote_ids: HashSet<String>,
    scores: HashMap<&'a str, u64>,
}

impl<'a> RankedAccumulator<'a> {
    fn new(definition: &'a RankedVotingDefinition) -> RankedAccumulator<'a> {
        let checker = RankedChecker::new(definition);
        let scores = checker.option_ids.iter().map(|id| (*id, 0)).collect();
        RankedAccumulator {
            checker,
            vote_ids: HashSet::new(),
            scores,
        }
    }
}

impl<'a> Accumulator for RankedAccumulator<'a> {
    type Vote = RankedVote;
    type Code = RankedErrorCode;
    type Output = RankedOptionResult;

    fn accept(&mut self, vote: RankedVote, errors: &mut DecisionErrors<RankedErrorCode>) {
        let label = format!("Vote {}", vote.id);
        if !self.vote_ids.insert(vote.id.clone()) {
            errors.push(DecisionError::vote(
                RankedErrorCode::DuplicateVoteId,
                format!("Duplicate vote ID: {}", vote.id),
            ));
        }
        let ranked = self.checker.check_ranking(&label, &vote.ballot, errors);
        debug!("ranked_voting: {}: scores {:?}", label, ranked);
        // The scores of an invalid vote are added too: in that case the whole tally
        // is rejected anyway.
        for (option_id, score) in ranked {
            if let Some(total) = self.scores.get_mut(option_id) {
                *total += score;
            }
        }
    }

    fn finish(self) -> Vec<RankedOptionResult> {
        let scores = self.scores;
        let mut res: Vec<RankedOptionResult> = self
            .checker
            .option_ids
            .iter()
            .map(|id| RankedOptionResult {
                option_id: id.to_string(),
                total_rank_score: scores.get(*id).cloned().unwrap_or(0),
            })
            .collect();
        res.sort_by_key(|r| r.total_rank_score);
        res
    }
}
