// Vote records shared by all the readers.

use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::decision::*;

/// Where a CSV row comes from, for error messages.
pub struct RowLocation {
    pub path: String,
    pub lineno: usize,
}

/// A vote, as read from a file, before it is handed to the tally.
pub trait VoteRecord: DeserializeOwned + 'static {
    type Vote;

    fn into_vote(self) -> Self::Vote;

    /// Reads the vote from a CSV row. The header is the first row of the file.
    fn from_csv(header: &StringRecord, row: &StringRecord, loc: &RowLocation) -> DecidoResult<Self>;
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SingleVoteRecord {
    #[serde(rename = "optionId")]
    pub option_id: String,
    #[serde(rename = "voterId")]
    pub voter_id: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedVoteRecord {
    pub id: String,
    #[serde(rename = "voterId")]
    pub voter_id: String,
    #[serde(rename = "optionsIdsRanked")]
    pub options_ids_ranked: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DotAssignmentRecord {
    #[serde(rename = "optionId")]
    pub option_id: String,
    pub dots: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DotVoteRecord {
    pub id: String,
    #[serde(rename = "voterId")]
    pub voter_id: String,
    #[serde(rename = "dotsAssignment")]
    pub dots_assignment: Vec<DotAssignmentRecord>,
}

fn cell(row: &StringRecord, idx: usize, loc: &RowLocation) -> DecidoResult<String> {
    let s = row.get(idx).context(CsvLineTooShortSnafu {
        path: loc.path.clone(),
        lineno: loc.lineno,
    })?;
    Ok(s.trim().to_string())
}

impl VoteRecord for SingleVoteRecord {
    type Vote = SingleVote;

    fn into_vote(self) -> SingleVote {
        SingleVote {
            option_id: self.option_id,
            voter_id: self.voter_id,
        }
    }

    fn from_csv(
        _header: &StringRecord,
        row: &StringRecord,
        loc: &RowLocation,
    ) -> DecidoResult<Self> {
        Ok(SingleVoteRecord {
            voter_id: cell(row, 0, loc)?,
            option_id: cell(row, 1, loc)?,
        })
    }
}

impl VoteRecord for RankedVoteRecord {
    type Vote = RankedVote;

    fn into_vote(self) -> RankedVote {
        RankedVote {
            id: self.id,
            ballot: RankedBallot {
                voter_id: self.voter_id,
                options_ids_ranked: self.options_ids_ranked,
            },
        }
    }

    fn from_csv(
        _header: &StringRecord,
        row: &StringRecord,
        loc: &RowLocation,
    ) -> DecidoResult<Self> {
        Ok(RankedVoteRecord {
            id: cell(row, 0, loc)?,
            voter_id: cell(row, 1, loc)?,
            options_ids_ranked: row
                .iter()
                .skip(2)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        })
    }
}

impl VoteRecord for DotVoteRecord {
    type Vote = DotVote;

    fn into_vote(self) -> DotVote {
        DotVote {
            id: self.id,
            ballot: DotBallot {
                voter_id: self.voter_id,
                dots_assignment: self
                    .dots_assignment
                    .into_iter()
                    .map(|a| DotAssignment {
                        option_id: a.option_id,
                        dots: a.dots,
                    })
                    .collect(),
            },
        }
    }

    fn from_csv(
        header: &StringRecord,
        row: &StringRecord,
        loc: &RowLocation,
    ) -> DecidoResult<Self> {
        let mut dots_assignment: Vec<DotAssignmentRecord> = Vec::new();
        for (idx, value) in row.iter().enumerate().skip(2) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let option_id = cell(header, idx, loc)?;
            let dots = value.parse::<i64>().context(CsvDotsSnafu {
                value,
                path: loc.path.clone(),
                lineno: loc.lineno,
            })?;
            dots_assignment.push(DotAssignmentRecord { option_id, dots });
        }
        Ok(DotVoteRecord {
            id: cell(row, 0, loc)?,
            voter_id: cell(row, 1, loc)?,
            dots_assignment,
        })
    }
}

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
