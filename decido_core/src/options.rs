use log::debug;
use std::collections::HashSet;

use crate::entities::*;

/// Validates the list of options of a decision.
///
/// All the violations are reported, in the order of the options:
/// * fewer than 2 options
/// * an id that was already used by a previous option
/// * an empty text
/// * a text that is the same (ignoring case) as the text of a previous option
pub fn validate_options(options: &[DecisionOption]) -> Result<(), DecisionErrors<OptionErrorCode>> {
    let mut errors: DecisionErrors<OptionErrorCode> = Vec::new();
    let mut option_ids: HashSet<&str> = HashSet::new();
    let mut option_texts: HashSet<String> = HashSet::new();

    if options.len() < 2 {
        errors.push(DecisionError::definition(
            OptionErrorCode::NotEnoughOptions,
            "There must be at least 2 options to vote on",
        ));
    }

    for (idx, option) in options.iter().enumerate() {
        let position = idx + 1;
        if !option_ids.insert(option.id.as_str()) {
            errors.push(DecisionError::definition(
                OptionErrorCode::DuplicateOptionIds,
                format!("Option #{}: option IDs must be unique", position),
            ));
        }
        if is_blank(&option.text) {
            errors.push(DecisionError::definition(
                OptionErrorCode::EmptyOptionText,
                format!("Option #{}: text must not be empty", position),
            ));
        }
        if !option_texts.insert(option.text.to_lowercase()) {
            errors.push(DecisionError::definition(
                OptionErrorCode::DuplicateOption,
                format!(
                    "Option #{}: option text is the same as a previous one",
                    position
                ),
            ));
        }
    }
    debug!(
        "validate_options: {} options, {} violations",
        options.len(),
        errors.len()
    );
    into_validation(errors)
}

/// The definition error for an empty question, if any.
pub(crate) fn check_question<C>(question: &str, code: C) -> Option<DecisionError<C>> {
    if is_blank(question) {
        Some(DecisionError::definition(code, "The question must not be empty"))
    } else {
        None
    }
}

/// Appends the option violations to the errors of a scheme.
pub(crate) fn extend_with_options<C: From<OptionErrorCode>>(
    errors: &mut DecisionErrors<C>,
    options: &[DecisionOption],
) {
    if let Err(option_errors) = validate_options(options) {
        errors.extend(option_errors.into_iter().map(DecisionError::into_code));
    }
}
