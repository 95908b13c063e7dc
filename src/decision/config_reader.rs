use crate::decision::*;

use decido_core::{DecisionError, DecisionOption, ShortCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "decisionName")]
    pub decision_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OptionConfig {
    pub id: String,
    pub text: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSpec {
    pub scheme: String,
    #[serde(default)]
    pub question: String,
    pub options: Vec<OptionConfig>,
    #[serde(rename = "nDotsPerParticipant")]
    pub n_dots_per_participant: Option<i64>,
}

impl DecisionSpec {
    pub fn decision_options(&self) -> Vec<DecisionOption> {
        self.options
            .iter()
            .map(|o| DecisionOption {
                id: o.id.clone(),
                text: o.text.clone(),
            })
            .collect()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteRowIndex")]
    pub _first_vote_row_index: Option<JSValue>,
}

impl VoteSource {
    /// The index (starting at 0) of the first row holding a vote in a CSV file.
    /// By default, the row just after the header.
    pub fn first_vote_row_index(&self) -> DecidoResult<usize> {
        match &self._first_vote_row_index {
            None => Ok(1),
            x => {
                let idx = read_js_int(x)?;
                ensure!(
                    idx >= 2,
                    ParsingJsonNumberSnafu {
                        value: idx.to_string()
                    }
                );
                Ok(idx - 1)
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub decision: DecisionSpec,
    #[serde(rename = "voteSources", default)]
    pub vote_sources: Vec<VoteSource>,
}

// ******** Output structures *********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub decision: String,
    pub scheme: String,
    pub question: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "violationType")]
    pub violation_type: String,
    #[serde(rename = "shortCode")]
    pub short_code: String,
    pub message: String,
}

impl<C: ShortCode> From<&DecisionError<C>> for ErrorRecord {
    fn from(e: &DecisionError<C>) -> Self {
        ErrorRecord {
            violation_type: e.violation_type.as_str().to_string(),
            short_code: e.short_code.as_str().to_string(),
            message: e.message.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SingleResultRecord {
    #[serde(rename = "optionId")]
    pub option_id: String,
    #[serde(rename = "nVotes")]
    pub n_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedResultRecord {
    #[serde(rename = "optionId")]
    pub option_id: String,
    #[serde(rename = "totalRankScore")]
    pub total_rank_score: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DotResultRecord {
    #[serde(rename = "optionId")]
    pub option_id: String,
    #[serde(rename = "nDots")]
    pub n_dots: i64,
    #[serde(rename = "nVoters")]
    pub n_voters: u64,
}

pub fn read_config(path: &str) -> DecidoResult<DecisionConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read config: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

pub fn read_summary(path: &str) -> DecidoResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

fn read_js_int(x: &Option<JSValue>) -> DecidoResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize).context(ParsingJsonNumberSnafu {
            value: n.to_string(),
        }),
        Some(JSValue::String(s)) => s
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu { value: s.clone() }),
        _ => None.context(ParsingJsonNumberSnafu {
            value: format!("{:?}", x),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(idx: Option<JSValue>) -> VoteSource {
        VoteSource {
            provider: "csv".to_string(),
            file_path: "votes.csv".to_string(),
            _first_vote_row_index: idx,
        }
    }

    #[test]
    fn first_vote_row() {
        assert_eq!(source(None).first_vote_row_index().unwrap(), 1);
        assert_eq!(
            source(Some(serde_json::json!(3))).first_vote_row_index().unwrap(),
            2
        );
        assert_eq!(
            source(Some(serde_json::json!("4"))).first_vote_row_index().unwrap(),
            3
        );
        assert!(source(Some(serde_json::json!(1))).first_vote_row_index().is_err());
        assert!(source(Some(serde_json::json!("x"))).first_vote_row_index().is_err());
    }

    #[test]
    fn parse_config() {
        let js = r#"{
            "outputSettings": {"decisionName": "lunch"},
            "decision": {
                "scheme": "dot",
                "question": "Lunch?",
                "options": [{"id": "a", "text": "Pizza"}, {"id": "b", "text": "Sushi"}],
                "nDotsPerParticipant": 2
            }
        }"#;
        let config: DecisionConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.decision_name, "lunch");
        assert!(config.output_settings.output_directory.is_none());
        assert!(config.vote_sources.is_empty());
        assert_eq!(config.decision.n_dots_per_participant, Some(2));
        assert_eq!(
            config.decision.decision_options(),
            vec![
                DecisionOption::new("a", "Pizza"),
                DecisionOption::new("b", "Sushi")
            ]
        );
    }
}
