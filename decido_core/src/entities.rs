// ********* Shared data structures ***********

use std::error::Error;
use std::fmt::{Debug, Display};

/// One of the options a decision is made on.
///
/// The `id` is what votes refer to, the `text` is what participants read.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DecisionOption {
    pub id: String,
    pub text: String,
}

impl DecisionOption {
    pub fn new(id: &str, text: &str) -> DecisionOption {
        DecisionOption {
            id: id.to_string(),
            text: text.to_string(),
        }
    }
}

/// Whether a violation concerns the definition of a decision or one of its votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ViolationType {
    Definition,
    Vote,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::Definition => "definition",
            ViolationType::Vote => "vote",
        }
    }
}

impl Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed set of violation codes.
///
/// Every voting scheme has its own enumeration. The string returned by `as_str` is
/// the stable, machine readable short code.
pub trait ShortCode: Copy + Eq + Debug {
    fn as_str(&self) -> &'static str;
}

/// The violations of the option list, shared by all the voting schemes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum OptionErrorCode {
    NotEnoughOptions,
    DuplicateOptionIds,
    EmptyOptionText,
    DuplicateOption,
}

impl ShortCode for OptionErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            OptionErrorCode::NotEnoughOptions => "not_enough_options",
            OptionErrorCode::DuplicateOptionIds => "duplicate_option_ids",
            OptionErrorCode::EmptyOptionText => "empty_option_text",
            OptionErrorCode::DuplicateOption => "duplicate_option",
        }
    }
}

/// A validation failure, either of a definition or of a vote.
///
/// The message is meant for humans and may change between versions. Use the
/// short code to react to a specific failure.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DecisionError<C> {
    pub violation_type: ViolationType,
    pub short_code: C,
    pub message: String,
}

/// All the violations found during one validation or tally.
pub type DecisionErrors<C> = Vec<DecisionError<C>>;

impl<C> DecisionError<C> {
    pub fn definition(short_code: C, message: impl Into<String>) -> DecisionError<C> {
        DecisionError {
            violation_type: ViolationType::Definition,
            short_code,
            message: message.into(),
        }
    }

    pub fn vote(short_code: C, message: impl Into<String>) -> DecisionError<C> {
        DecisionError {
            violation_type: ViolationType::Vote,
            short_code,
            message: message.into(),
        }
    }

    /// Converts the code into the code type of an enclosing scheme.
    pub fn into_code<D: From<C>>(self) -> DecisionError<D> {
        DecisionError {
            violation_type: self.violation_type,
            short_code: D::from(self.short_code),
            message: self.message,
        }
    }
}

impl<C: ShortCode> Error for DecisionError<C> {}

impl<C: ShortCode> Display for DecisionError<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.violation_type,
            self.short_code.as_str(),
            self.message
        )
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Turns an accumulated list of errors into the result of a validation.
pub(crate) fn into_validation<C>(errors: DecisionErrors<C>) -> Result<(), DecisionErrors<C>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
