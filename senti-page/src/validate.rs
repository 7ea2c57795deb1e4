use senti_common::Mode;
use thiserror::Error;

/// Input rejected before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter some text to analyze.")]
    Empty,
    #[error("Batch mode accepts at most {max} non-empty lines (got {count}).")]
    TooManyLines { count: usize, max: usize },
}

impl ValidationError {
    /// Short heading for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::Empty => "Input required",
            ValidationError::TooManyLines { .. } => "Too many lines",
        }
    }
}

/// Validated input, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Single(String),
    Batch(Vec<String>),
}

/// Non-blank lines of `text`, trimmed, in their original order.
pub fn batch_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check `text` against the rules for `mode`.
///
/// ```
/// use senti_common::Mode;
/// use senti_page::validate::{validate, Submission, ValidationError};
///
/// assert_eq!(validate("  \n ", Mode::Single, 10), Err(ValidationError::Empty));
/// assert_eq!(
///     validate("a\n\n b \n", Mode::Batch, 10),
///     Ok(Submission::Batch(vec!["a".into(), "b".into()]))
/// );
/// ```
pub fn validate(text: &str, mode: Mode, max_lines: usize) -> Result<Submission, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    match mode {
        Mode::Single => Ok(Submission::Single(trimmed.to_string())),
        Mode::Batch => {
            let lines = batch_lines(text);
            if lines.len() > max_lines {
                return Err(ValidationError::TooManyLines {
                    count: lines.len(),
                    max: max_lines,
                });
            }
            Ok(Submission::Batch(lines))
        }
    }
}
