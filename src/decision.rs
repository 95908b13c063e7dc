use log::{debug, info, warn};

use decido_core::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::decision::config_reader::*;
use crate::decision::io_common::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum DecidoError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    ParsingJsonLine {
        source: serde_json::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Expected a number greater than 1, found {value}"))]
    ParsingJsonNumber { value: String },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Invalid number of dots {value:?} on line {lineno} of {path}"))]
    CsvDots {
        source: std::num::ParseIntError,
        value: String,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(
        "Decision tally rejected: {count} violations (fix or remove the listed {kind})"
    ))]
    Rejected { count: usize, kind: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DecidoResult<T> = Result<T, DecidoError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Scheme {
    Single,
    Ranked,
    Dot,
}

fn validate_scheme(scheme: &str) -> DecidoResult<Scheme> {
    match scheme {
        "single" => Ok(Scheme::Single),
        "ranked" => Ok(Scheme::Ranked),
        "dot" => Ok(Scheme::Dot),
        x => whatever!("Unknown voting scheme {:?} (expected single, ranked or dot)", x),
    }
}

/// What came out of a run, before it gets written.
enum Outcome {
    ValidDefinition,
    Results(JSValue),
    Rejected(Vec<ErrorRecord>, bool),
}

fn outcome_of_validation<C: ShortCode>(res: Result<(), DecisionErrors<C>>) -> Outcome {
    match res {
        Ok(()) => Outcome::ValidDefinition,
        Err(errors) => Outcome::Rejected(errors.iter().map(ErrorRecord::from).collect(), true),
    }
}

fn outcome_of_tally<R, C, O, F>(tally: Tally<R, C>, to_record: F) -> DecidoResult<Outcome>
where
    C: ShortCode,
    O: Serialize,
    F: Fn(R) -> O,
{
    match tally {
        Ok(results) => {
            let records: Vec<O> = results.into_iter().map(to_record).collect();
            let js = serde_json::to_value(records).context(SerializingSummarySnafu)?;
            Ok(Outcome::Results(js))
        }
        Err(errors) => {
            let is_definition = errors
                .iter()
                .all(|e| e.violation_type == ViolationType::Definition);
            Ok(Outcome::Rejected(
                errors.iter().map(ErrorRecord::from).collect(),
                is_definition,
            ))
        }
    }
}

/// Chains the votes of all the sources. Files are opened upfront, votes are read
/// when they are pulled.
fn read_votes<R: VoteRecord>(
    root_path: &Path,
    sources: &[VoteSource],
) -> DecidoResult<impl Iterator<Item = DecidoResult<R::Vote>>> {
    let mut readers: Vec<io_json::VoteIter<R>> = Vec::new();
    for cfs in sources.iter() {
        let p: PathBuf = root_path.join(&cfs.file_path);
        info!(
            "Attempting to read vote file {:?} with provider {}",
            simplify_file_name(&p),
            cfs.provider
        );
        let reader = match cfs.provider.as_str() {
            "json" => io_json::read_json_votes::<R>(&p)?,
            "jsonl" => io_json::read_json_lines_votes::<R>(&p)?,
            "csv" => io_csv::read_csv_votes::<R>(&p, cfs)?,
            x => whatever!("Provider not implemented {:?}", x),
        };
        readers.push(reader);
    }
    Ok(readers
        .into_iter()
        .flatten()
        .map(|r| r.map(R::into_vote)))
}

fn run_scheme(
    scheme: Scheme,
    spec: &DecisionSpec,
    root_path: &Path,
    sources: &[VoteSource],
    validate_only: bool,
) -> DecidoResult<Outcome> {
    let options = spec.decision_options();
    match scheme {
        Scheme::Single => {
            let definition = SingleVotingDefinition {
                question: spec.question.clone(),
                options,
            };
            if validate_only {
                return Ok(outcome_of_validation(validate_single_voting_definition(
                    &definition,
                )));
            }
            let votes = read_votes::<SingleVoteRecord>(root_path, sources)?;
            let tally = try_calculate_single_voting_results(&definition, votes)?;
            outcome_of_tally(tally, |r| SingleResultRecord {
                option_id: r.option_id,
                n_votes: r.n_votes,
            })
        }
        Scheme::Ranked => {
            let definition = RankedVotingDefinition {
                question: spec.question.clone(),
                options,
            };
            if validate_only {
                return Ok(outcome_of_validation(validate_ranked_voting_definition(
                    &definition,
                )));
            }
            let votes = read_votes::<RankedVoteRecord>(root_path, sources)?;
            let tally = try_calculate_ranked_voting_results(&definition, votes)?;
            outcome_of_tally(tally, |r| RankedResultRecord {
                option_id: r.option_id,
                total_rank_score: r.total_rank_score,
            })
        }
        Scheme::Dot => {
            let n_dots_per_participant = match spec.n_dots_per_participant {
                Some(n) => n,
                None => whatever!("nDotsPerParticipant is required for dot voting"),
            };
            let definition = DotVotingDefinition {
                question: spec.question.clone(),
                options,
                n_dots_per_participant,
            };
            if validate_only {
                return Ok(outcome_of_validation(validate_dot_voting_definition(
                    &definition,
                )));
            }
            let votes = read_votes::<DotVoteRecord>(root_path, sources)?;
            let tally = try_calculate_dot_voting_results(&definition, votes)?;
            outcome_of_tally(tally, |r| DotResultRecord {
                option_id: r.option_id,
                n_dots: r.n_dots,
                n_voters: r.n_voters,
            })
        }
    }
}

fn build_summary_js(config: &DecisionConfig, outcome: &Outcome) -> JSValue {
    let c = OutputConfig {
        decision: config.output_settings.decision_name.clone(),
        scheme: config.decision.scheme.clone(),
        question: config.decision.question.clone(),
    };
    match outcome {
        Outcome::ValidDefinition => json!({ "config": c, "valid": true }),
        Outcome::Results(results) => json!({ "config": c, "results": results }),
        Outcome::Rejected(errors, _) => json!({ "config": c, "errors": errors }),
    }
}

/// Infers the provider from the extension of the file.
fn input_provider(path: &str, input_type: &Option<String>) -> String {
    if let Some(t) = input_type {
        return t.clone();
    }
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("csv") => "csv".to_string(),
        Some("jsonl") => "jsonl".to_string(),
        _ => "json".to_string(),
    }
}

fn output_path(args: &Args, config: &DecisionConfig, root_path: &Path) -> Option<String> {
    match (&args.out, &config.output_settings.output_directory) {
        (Some(out), _) if out == "stdout" => None,
        (Some(out), _) => Some(out.clone()),
        (None, Some(dir)) => {
            let file_name = format!("{}_summary.json", config.output_settings.decision_name);
            let p: PathBuf = root_path.join(dir).join(file_name);
            Some(p.display().to_string())
        }
        (None, None) => None,
    }
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> DecidoResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
            path: reference_path,
        })?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_decision(args: &Args) -> DecidoResult<()> {
    let config = read_config(&args.config)?;
    info!("config: {:?}", config);

    let scheme = validate_scheme(&config.decision.scheme)?;
    let root_path: PathBuf = Path::new(&args.config)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    // A vote file given on the command line replaces the sources of the config.
    let (votes_root, sources): (PathBuf, Vec<VoteSource>) = match &args.input {
        Some(input) => (
            PathBuf::new(),
            vec![VoteSource {
                provider: input_provider(input, &args.input_type),
                file_path: input.clone(),
                _first_vote_row_index: None,
            }],
        ),
        None => (root_path.clone(), config.vote_sources.clone()),
    };
    if sources.is_empty() && !args.validate_only {
        warn!("No vote source given: tallying an empty set of votes");
    }

    let outcome = run_scheme(
        scheme,
        &config.decision,
        &votes_root,
        &sources,
        args.validate_only,
    )?;

    let result_js = build_summary_js(&config, &outcome);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu)?;
    match output_path(args, &config, &root_path) {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(&path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
        }
        None => println!("{}", pretty_js_stats),
    }

    if let Outcome::Rejected(errors, is_definition) = &outcome {
        for e in errors.iter() {
            warn!("{}:{}: {}", e.violation_type, e.short_code, e.message);
        }
        let kind = if *is_definition {
            "definition problems"
        } else {
            "invalid votes"
        };
        return RejectedSnafu {
            count: errors.len(),
            kind,
        }
        .fail();
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}
