use clap::Parser;

/// This is a tallying program for group decisions (single choice, ranked choice and dot voting).
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the decision, in JSON format.
    /// For more information about the file format, read the documentation of decido_core::manual.
    #[clap(short, long, value_parser)]
    pub config: String,
    /// (file path) A reference file containing the summary of a decision in JSON format. If provided, decido will
    /// check that the tallied output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the decision will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the --config file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the votes are read from this file. Setting this option overrides the
    /// vote sources of the --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json, jsonl or csv) The type of the input. By default, it is guessed from the extension of the file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// If passed as an argument, only the definition of the decision is checked. No vote is read.
    #[clap(long, takes_value = false)]
    pub validate_only: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
