//! Error types for dump parsing and rendering.

use thiserror::Error;

/// Errors that can occur while converting a dump.
///
/// Line numbers are 1-based and count every line of the original input,
/// blank lines included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed offset in `{text}`")]
    MalformedOffset { line: usize, text: String },

    #[error("line {line}: missing `:` delimiter in `{text}`")]
    MissingDelimiter { line: usize, text: String },

    #[error("line {line}: missing field name in `{text}`")]
    MissingName { line: usize, text: String },

    #[error("line {line}: malformed bitfield spec in `{text}`")]
    MalformedBitfieldSpec { line: usize, text: String },

    #[error("line {line}: malformed array subscript in `{text}`")]
    MalformedArraySpec { line: usize, text: String },

    #[error("line {line}: missing type in `{text}`")]
    MissingType { line: usize, text: String },

    #[error("line {line}: unions and packs nested deeper than {limit} levels")]
    NestingTooDeep { line: usize, limit: usize },

    #[error("no `module!Type` header line found")]
    UnknownHeader,
}

impl ParseError {
    /// Source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedOffset { line, .. }
            | Self::MissingDelimiter { line, .. }
            | Self::MissingName { line, .. }
            | Self::MalformedBitfieldSpec { line, .. }
            | Self::MalformedArraySpec { line, .. }
            | Self::MissingType { line, .. }
            | Self::NestingTooDeep { line, .. } => Some(*line),
            Self::UnknownHeader => None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
