/*!
Validation and tallying of group decisions.

Three voting schemes are supported:
* single choice: every voter picks one option, the options are ranked by number of votes
* ranked choice: every voter ranks all the options, the positions are summed (Borda count)
* dot voting: every voter distributes a limited number of dots between the options

Every scheme comes with the same three functions: a validator for the definition of
the decision, a validator for one incoming vote, and a tally over a stream of votes.
A tally either returns the results for all the options, or all the violations it
found. A single invalid vote rejects the whole tally.

```
use decido_core::*;

let definition = DotVotingDefinition {
    question: "Where do we go?".to_string(),
    options: vec![DecisionOption::new("x", "Beach"), DecisionOption::new("y", "Mountain")],
    n_dots_per_participant: 3,
};
let votes = vec![DotVote::new("1", "anna", &[("x", 2), ("y", 1)])];
let results = calculate_dot_voting_results(&definition, votes).unwrap();
assert_eq!(results[0].option_id, "x");
assert_eq!(results[0].n_dots, 2);
```

See the [manual] for the command line program.
*/
mod dot;
mod entities;
pub mod in_memory;
pub mod manual;
mod options;
mod ranked;
mod single;
mod tally;
pub mod use_cases;

pub use crate::dot::*;
pub use crate::entities::{
    DecisionError, DecisionErrors, DecisionOption, OptionErrorCode, ShortCode, ViolationType,
};
pub use crate::options::validate_options;
pub use crate::ranked::*;
pub use crate::single::*;
pub use crate::tally::Tally;
