/*!

This is the long-form manual for `decido_core` and `decido`.

## Voting schemes

### `single`

Every voter picks exactly one option. A voter may only vote once.
The results are sorted by number of votes, and then by option id.

### `ranked`

Every voter ranks all the options, the first one being the preferred one.
The first position is worth 1 point, the second 2 points, and so on. The option
with the lowest total wins.

### `dot`

Every voter distributes at most `nDotsPerParticipant` dots between the options
(at least one dot). The results are sorted by number of dots and then by number
of voters.

## Rejected tallies

A tally is all or nothing: if any vote is invalid, no result is reported. Instead,
all the violations found in the votes are reported. Fix or remove the listed votes
and run the tally again.

Every violation comes with a short code:

| scheme | definition | vote |
|--------|------------|------|
| all    | `not_enough_options`, `duplicate_option_ids`, `empty_option_text`, `duplicate_option` | |
| single | `empty_question` | `duplicate_vote`, `invalid_option` |
| ranked | `empty_question` | `duplicate_vote_id`, `invalid_option_id`, `duplicate_option_in_vote`, `missing_options_in_vote`, `invalid_voter_id` |
| dot    | `invalid_dots_number` | `duplicate_vote_id`, `invalid_option`, `invalid_dots_number`, `no_dots_assigned`, `exceeds_dots_limit_in_vote`, `invalid_voter_id` |

## Configuration

`decido` reads the decision from a JSON file:

```text
{
  "outputSettings": { "decisionName": "offsite", "outputDirectory": "out" },
  "decision": {
    "scheme": "dot",
    "question": "Where do we go?",
    "options": [ { "id": "x", "text": "Beach" }, { "id": "y", "text": "Mountain" } ],
    "nDotsPerParticipant": 3
  },
  "voteSources": [ { "provider": "jsonl", "filePath": "votes.jsonl" } ]
}
```

`nDotsPerParticipant` is only used by dot voting. The paths of the vote sources are
relative to the configuration file. `outputDirectory` is optional.

## Input formats

### `json`

A JSON array of votes:
* single: `{"optionId": "x", "voterId": "anna"}`
* ranked: `{"id": "1", "voterId": "anna", "optionsIdsRanked": ["y", "x"]}`
* dot: `{"id": "1", "voterId": "anna", "dotsAssignment": [{"optionId": "x", "dots": 2}]}`

### `jsonl`

The same votes, one per line. The file is read one line at a time, blank lines are
skipped.

### `csv`

A header row is expected. The first data row may be changed with
`firstVoteRowIndex` (1-based, the header is row 1).

Single choice:

```text
voterId,optionId
anna,x
bob,y
```

Ranked choice, one column per position, empty cells are skipped:

```text
id,voterId,choice 1,choice 2
1,anna,y,x
```

Dot voting, one column per option id, the cells hold the number of dots:

```text
id,voterId,x,y
1,anna,2,1
2,bob,,3
```

## Output

The summary is a JSON document with the decision and either `results` or `errors`.
It is written to `--out` (`stdout` by default), or to
`<outputDirectory>/<decisionName>_summary.json`.

```text
decido --config lunch.json --input votes.csv --out lunch_summary.json
```

With `--validate-only`, no vote is read and a valid definition gives `"valid": true`
instead of the results. When the tally is rejected, the summary with the errors is
still written and the program exits with a non-zero status. With
`--reference <file>`, the summary is compared to an expected summary and the
differences are printed.

 */
