use log::debug;
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::dot::*;
use crate::use_cases::*;

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("Decision with ID {decision_id} not found"))]
    UnknownDecision { decision_id: String },
    #[snafu(display("The in-memory store is poisoned"))]
    LockPoisoned,
}

#[derive(Debug, Default)]
struct Contents {
    decisions: HashMap<String, DotDecision>,
    votes: HashMap<String, Vec<DotVote>>,
    vote_id_counter: u64,
}

/// Decisions and votes kept in memory. Nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryDotDecisions {
    contents: Mutex<Contents>,
}

impl InMemoryDotDecisions {
    pub fn new() -> InMemoryDotDecisions {
        InMemoryDotDecisions::default()
    }

    /// Registers a decision. An existing decision with the same id is replaced, its
    /// votes are kept.
    pub fn add_decision(&self, decision: DotDecision) -> Result<(), StoreError> {
        let mut contents = self.lock()?;
        contents.votes.entry(decision.id.clone()).or_default();
        contents.decisions.insert(decision.id.clone(), decision);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Contents>, StoreError> {
        self.contents.lock().ok().context(LockPoisonedSnafu)
    }
}

impl DotDecisionProvider for InMemoryDotDecisions {
    type Error = StoreError;

    fn get_dot_decision(&self, decision_id: &str) -> Result<Option<DotDecision>, StoreError> {
        Ok(self.lock()?.decisions.get(decision_id).cloned())
    }
}

impl DotDecisionVotesProvider for InMemoryDotDecisions {
    type Error = StoreError;

    fn votes_for_decision<'a>(
        &'a self,
        decision_id: &str,
    ) -> Box<dyn Iterator<Item = Result<DotVote, StoreError>> + 'a> {
        // The lock is not held while the votes are consumed: this iterates over a
        // snapshot.
        match self.lock() {
            Ok(contents) => {
                let snapshot: Vec<DotVote> =
                    contents.votes.get(decision_id).cloned().unwrap_or_default();
                Box::new(snapshot.into_iter().map(Ok))
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn votes_for_voter(
        &self,
        decision_id: &str,
        voter_id: &str,
    ) -> Result<Vec<DotVote>, StoreError> {
        let contents = self.lock()?;
        Ok(contents
            .votes
            .get(decision_id)
            .map(|votes| {
                votes
                    .iter()
                    .filter(|v| v.ballot.voter_id == voter_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl DotDecisionVotesStore for InMemoryDotDecisions {
    fn store_new_vote(&self, decision_id: &str, ballot: DotBallot) -> Result<DotVote, StoreError> {
        let mut contents = self.lock()?;
        ensure!(
            contents.decisions.contains_key(decision_id),
            UnknownDecisionSnafu { decision_id }
        );
        contents.vote_id_counter += 1;
        let vote = DotVote {
            id: format!("vote-{}", contents.vote_id_counter),
            ballot,
        };
        debug!("store_new_vote: {}: {:?}", decision_id, vote);
        contents
            .votes
            .entry(decision_id.to_string())
            .or_default()
            .push(vote.clone());
        Ok(vote)
    }
}
