use log::{debug, info, warn};
use std::convert::Infallible;

use crate::entities::*;

/// The outcome of a tally: either the ordered results for all the options, or all
/// the violations that prevented the computation.
///
/// A tally never contains partial results: a single invalid vote rejects it.
pub type Tally<R, C> = Result<Vec<R>, DecisionErrors<C>>;

/// The state kept while consuming the votes of one decision.
///
/// An accumulator lives for the duration of a single tally.
pub(crate) trait Accumulator {
    type Vote;
    type Code: ShortCode;
    type Output;

    /// Takes one vote into account, recording its violations if it has any.
    fn accept(&mut self, vote: Self::Vote, errors: &mut DecisionErrors<Self::Code>);

    /// The final, ordered results.
    fn finish(self) -> Vec<Self::Output>;
}

/// Runs a tally over a sequence of votes that is pulled one vote at a time.
///
/// The definition is checked first: if it is invalid, no vote is read. Otherwise
/// all the votes are consumed, even after the first invalid vote, so that every
/// violation gets reported. A failure of the source stops the tally and is
/// returned as is.
pub(crate) fn run_tally<A, I, E>(
    scheme: &str,
    definition_check: Result<(), DecisionErrors<A::Code>>,
    mut accumulator: A,
    votes: I,
) -> Result<Tally<A::Output, A::Code>, E>
where
    A: Accumulator,
    I: IntoIterator<Item = Result<A::Vote, E>>,
{
    if let Err(errors) = definition_check {
        info!(
            "{}: invalid definition ({} violations), no vote processed",
            scheme,
            errors.len()
        );
        return Ok(Err(errors));
    }

    let mut errors: DecisionErrors<A::Code> = Vec::new();
    let mut num_votes: usize = 0;
    for vote in votes {
        let vote = vote?;
        num_votes += 1;
        let num_errors = errors.len();
        accumulator.accept(vote, &mut errors);
        if errors.len() > num_errors {
            debug!(
                "{}: vote #{} has {} violations",
                scheme,
                num_votes,
                errors.len() - num_errors
            );
        }
    }
    info!("{}: processed {} votes", scheme, num_votes);

    if !errors.is_empty() {
        warn!(
            "{}: tally rejected, {} violations in {} votes",
            scheme,
            errors.len(),
            num_votes
        );
        return Ok(Err(errors));
    }
    Ok(Ok(accumulator.finish()))
}

pub(crate) fn never_fails<T>(res: Result<T, Infallible>) -> T {
    match res {
        Ok(x) => x,
        Err(e) => match e {},
    }
}
