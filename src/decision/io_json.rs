// Readers for votes stored as JSON.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::decision::{io_common::VoteRecord, *};

pub type VoteIter<R> = Box<dyn Iterator<Item = DecidoResult<R>>>;

/// Reads a JSON array of votes. The whole file is parsed at once.
pub fn read_json_votes<R: VoteRecord>(path: &Path) -> DecidoResult<VoteIter<R>> {
    let path_s = path.display().to_string();
    let file = File::open(path).context(OpeningFileSnafu {
        path: path_s.clone(),
    })?;
    let votes: Vec<R> =
        serde_json::from_reader(BufReader::new(file)).context(ParsingJsonSnafu { path: path_s })?;
    debug!("read_json_votes: {} votes in {:?}", votes.len(), path);
    Ok(Box::new(votes.into_iter().map(Ok)))
}

/// Reads one vote per line. Lines are only read when the votes are pulled.
pub fn read_json_lines_votes<R: VoteRecord>(path: &Path) -> DecidoResult<VoteIter<R>> {
    let path_s = path.display().to_string();
    let file = File::open(path).context(OpeningFileSnafu {
        path: path_s.clone(),
    })?;
    let lines = BufReader::new(file).lines().enumerate();
    let votes = lines.filter_map(move |(idx, line_r)| {
        let lineno = idx + 1;
        let line = match line_r.context(ReadingFileSnafu {
            path: path_s.clone(),
            lineno,
        }) {
            Ok(l) => l,
            Err(e) => return Some(Err(e)),
        };
        if line.trim().is_empty() {
            return None;
        }
        Some(
            serde_json::from_str::<R>(&line).context(ParsingJsonLineSnafu {
                path: path_s.clone(),
                lineno,
            }),
        )
    });
    Ok(Box::new(votes))
}
