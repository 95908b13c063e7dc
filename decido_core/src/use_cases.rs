/*!
Casting and tallying dot votes against a storage.

The storage is reached through the traits of this module; this crate provides
an in-memory implementation in [`crate::in_memory`].
*/
use log::{debug, info};
use snafu::prelude::*;

use crate::dot::*;
use crate::entities::*;

/// A dot voting decision, as stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DotDecision {
    pub id: String,
    pub definition: DotVotingDefinition,
}

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Looks up decisions.
pub trait DotDecisionProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_dot_decision(&self, decision_id: &str) -> Result<Option<DotDecision>, Self::Error>;
}

/// Reads the votes of decisions.
pub trait DotDecisionVotesProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All the votes of a decision, read one at a time.
    fn votes_for_decision<'a>(
        &'a self,
        decision_id: &str,
    ) -> Box<dyn Iterator<Item = Result<DotVote, Self::Error>> + 'a>;

    fn votes_for_voter(
        &self,
        decision_id: &str,
        voter_id: &str,
    ) -> Result<Vec<DotVote>, Self::Error>;
}

/// Stores new votes.
pub trait DotDecisionVotesStore: DotDecisionVotesProvider {
    /// Stores the ballot and returns the vote with its newly assigned id.
    fn store_new_vote(&self, decision_id: &str, ballot: DotBallot) -> Result<DotVote, Self::Error>;
}

#[derive(Debug, Snafu)]
pub enum DecisionServiceError {
    #[snafu(display("Decision id not found: {decision_id}"))]
    DecisionNotFound { decision_id: String },

    #[snafu(display("Could not validate the vote:\n{}", format_errors(errors)))]
    InvalidVote { errors: DecisionErrors<DotErrorCode> },

    #[snafu(display("Voter {voter_id} has already voted"))]
    AlreadyVoted { voter_id: String },

    #[snafu(display("Storage failure for decision {decision_id}"))]
    Storage {
        decision_id: String,
        source: BoxedError,
    },
}

fn format_errors(errors: &[DecisionError<DotErrorCode>]) -> String {
    errors
        .iter()
        .map(|e| format!("- {}", e.message))
        .collect::<Vec<String>>()
        .join("\n")
}

fn boxed<E: std::error::Error + Send + Sync + 'static>(e: E) -> BoxedError {
    Box::new(e)
}

fn find_decision<P: DotDecisionProvider + ?Sized>(
    provider: &P,
    decision_id: &str,
) -> Result<DotDecision, DecisionServiceError> {
    provider
        .get_dot_decision(decision_id)
        .map_err(boxed)
        .context(StorageSnafu { decision_id })?
        .context(DecisionNotFoundSnafu { decision_id })
}

/// Validates a ballot and stores it, if the voter did not vote yet for this decision.
pub fn cast_dot_vote<P, S>(
    provider: &P,
    store: &S,
    decision_id: &str,
    ballot: DotBallot,
) -> Result<DotVote, DecisionServiceError>
where
    P: DotDecisionProvider + ?Sized,
    S: DotDecisionVotesStore + ?Sized,
{
    let decision = find_decision(provider, decision_id)?;
    if let Err(errors) = validate_dot_vote(&decision.definition, &ballot) {
        debug!(
            "cast_dot_vote: decision {}: rejected ballot {:?}",
            decision_id, ballot
        );
        return InvalidVoteSnafu { errors }.fail();
    }

    let previous_votes = store
        .votes_for_voter(decision_id, &ballot.voter_id)
        .map_err(boxed)
        .context(StorageSnafu { decision_id })?;
    ensure!(
        previous_votes.is_empty(),
        AlreadyVotedSnafu {
            voter_id: ballot.voter_id.clone()
        }
    );

    let vote = store
        .store_new_vote(decision_id, ballot)
        .map_err(boxed)
        .context(StorageSnafu { decision_id })?;
    info!(
        "cast_dot_vote: decision {}: stored vote {} of voter {}",
        decision_id, vote.id, vote.ballot.voter_id
    );
    Ok(vote)
}

/// Tallies all the stored votes of a decision.
pub fn tally_dot_decision<P, S>(
    provider: &P,
    votes: &S,
    decision_id: &str,
) -> Result<DotVotingResults, DecisionServiceError>
where
    P: DotDecisionProvider + ?Sized,
    S: DotDecisionVotesProvider + ?Sized,
{
    let decision = find_decision(provider, decision_id)?;
    let stored_votes = votes.votes_for_decision(decision_id).map(|v| v.map_err(boxed));
    try_calculate_dot_voting_results(&decision.definition, stored_votes)
        .context(StorageSnafu { decision_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryDotDecisions;

    fn data() -> InMemoryDotDecisions {
        let data = InMemoryDotDecisions::new();
        data.add_decision(DotDecision {
            id: "d1".to_string(),
            definition: DotVotingDefinition {
                question: "Which features?".to_string(),
                options: vec![
                    DecisionOption::new("option1", "Option 1"),
                    DecisionOption::new("option2", "Option 2"),
                ],
                n_dots_per_participant: 2,
            },
        })
        .unwrap();
        data
    }

    #[test]
    fn cast_and_tally() {
        let data = data();
        let v1 =
            cast_dot_vote(&data, &data, "d1", DotBallot::new("anna", &[("option2", 2)])).unwrap();
        assert_eq!(v1.id, "vote-1");
        let v2 = cast_dot_vote(
            &data,
            &data,
            "d1",
            DotBallot::new("bob", &[("option1", 1), ("option2", 1)]),
        )
        .unwrap();
        assert_eq!(v2.id, "vote-2");

        let res = tally_dot_decision(&data, &data, "d1").unwrap().unwrap();
        assert_eq!(
            res,
            vec![
                DotOptionResult {
                    option_id: "option2".to_string(),
                    n_dots: 3,
                    n_voters: 2
                },
                DotOptionResult {
                    option_id: "option1".to_string(),
                    n_dots: 1,
                    n_voters: 1
                }
            ]
        );
    }

    #[test]
    fn unknown_decision() {
        let data = data();
        let res = cast_dot_vote(&data, &data, "nope", DotBallot::new("anna", &[("option1", 1)]));
        assert!(matches!(
            res,
            Err(DecisionServiceError::DecisionNotFound { .. })
        ));
        assert!(matches!(
            tally_dot_decision(&data, &data, "nope"),
            Err(DecisionServiceError::DecisionNotFound { .. })
        ));
    }

    #[test]
    fn invalid_ballot_is_not_stored() {
        let data = data();
        let res = cast_dot_vote(&data, &data, "d1", DotBallot::new("anna", &[("option1", 3)]));
        match res {
            Err(DecisionServiceError::InvalidVote { errors }) => {
                assert_eq!(errors[0].short_code, DotErrorCode::ExceedsDotsLimitInVote);
            }
            x => panic!("unexpected result {:?}", x),
        }
        assert!(data.votes_for_voter("d1", "anna").unwrap().is_empty());
    }

    #[test]
    fn second_vote_is_refused() {
        let data = data();
        cast_dot_vote(&data, &data, "d1", DotBallot::new("anna", &[("option1", 1)])).unwrap();
        let res = cast_dot_vote(&data, &data, "d1", DotBallot::new("anna", &[("option2", 1)]));
        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "Voter anna has already voted");
    }

    #[test]
    fn invalid_vote_message_lists_violations() {
        let err = DecisionServiceError::InvalidVote {
            errors: vec![
                DecisionError::vote(DotErrorCode::NoDotsAssigned, "no dots"),
                DecisionError::vote(DotErrorCode::InvalidVoterId, "no voter"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Could not validate the vote:\n- no dots\n- no voter"
        );
    }
}
