use thiserror::Error;

/// Per-row decode failures. A failing row never aborts its siblings; the
/// caller receives the failures next to the successfully decoded rows and
/// decides policy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("Row {index}: malformed response JSON: {message}")]
    MalformedRow { index: usize, message: String },
    #[error("Row {index}: missing `{field}` text field")]
    MissingResponseField { index: usize, field: String },
}
