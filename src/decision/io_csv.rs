// Primitives for reading CSV files.

use crate::decision::{
    io_common::{RowLocation, VoteRecord},
    io_json::VoteIter,
    *,
};

/// Reads the votes of a CSV file, one row at a time.
///
/// The first row is the header. The votes start at the row given by the source
/// (by default, right after the header).
pub fn read_csv_votes<R: VoteRecord>(path: &Path, cfs: &VoteSource) -> DecidoResult<VoteIter<R>> {
    let path_s = path.display().to_string();
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_s.clone(),
        })?;
    let mut records = rdr.into_records();
    let header = match records.next() {
        Some(r) => r.context(CsvLineParseSnafu {
            path: path_s.clone(),
            lineno: 1_usize,
        })?,
        None => {
            warn!("read_csv_votes: empty file {:?}", path_s);
            return Ok(Box::new(std::iter::empty()));
        }
    };
    debug!("read_csv_votes: header: {:?}", header);
    // The header has already been read.
    for _ in 1..first_row {
        _ = records.next();
    }

    let votes = records.enumerate().map(move |(idx, line_r)| {
        let lineno = idx + first_row + 1;
        let line = line_r.context(CsvLineParseSnafu {
            path: path_s.clone(),
            lineno,
        })?;
        debug!("read_csv_votes: lineno: {:?} row: {:?}", lineno, line);
        R::from_csv(
            &header,
            &line,
            &RowLocation {
                path: path_s.clone(),
                lineno,
            },
        )
    });
    Ok(Box::new(votes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::io_common::{RankedVoteRecord, SingleVoteRecord};
    use crate::decision::tests::write_fixture;

    fn source(first_row: Option<u64>) -> VoteSource {
        VoteSource {
            provider: "csv".to_string(),
            file_path: "".to_string(),
            _first_vote_row_index: first_row.map(|x| serde_json::json!(x)),
        }
    }

    #[test]
    fn ranked_votes_with_line_numbers() {
        let p = write_fixture(
            "io_csv_ranked.csv",
            "id,voterId,choice 1,choice 2\n1,anna,b,a\n2,bob,a\n",
        );
        let votes: Vec<RankedVote> = read_csv_votes::<RankedVoteRecord>(&p, &source(None))
            .unwrap()
            .map(|r| r.unwrap().into_vote())
            .collect();
        assert_eq!(
            votes,
            vec![
                RankedVote::new("1", "anna", &["b", "a"]),
                RankedVote::new("2", "bob", &["a"])
            ]
        );
    }

    #[test]
    fn skipping_rows() {
        let p = write_fixture(
            "io_csv_single.csv",
            "voterId,optionId\nignored,row\nanna,x\nbob\n",
        );
        let votes: Vec<DecidoResult<SingleVoteRecord>> =
            read_csv_votes::<SingleVoteRecord>(&p, &source(Some(3)))
                .unwrap()
                .collect();
        assert_eq!(votes.len(), 2);
        assert_eq!(
            votes[0].as_ref().unwrap().clone().into_vote(),
            SingleVote::new("x", "anna")
        );
        match &votes[1] {
            Err(DecidoError::CsvLineTooShort { lineno, .. }) => assert_eq!(*lineno, 4),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn empty_file() {
        let p = write_fixture("io_csv_empty.csv", "");
        let votes = read_csv_votes::<SingleVoteRecord>(&p, &source(None)).unwrap();
        assert_eq!(votes.count(), 0);
    }
}
