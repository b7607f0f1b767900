use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while parsing versions, ranges and requirements.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A version token contained characters outside `[0-9A-Za-z_]`.
    #[error("invalid version token '{token}'")]
    #[diagnostic(help("version tokens may only contain alphanumerics and underscores"))]
    InvalidToken { token: String },

    /// Malformed version string (empty tokens, doubled separators, etc.).
    #[error("invalid version syntax: '{input}'")]
    InvalidVersion { input: String },

    /// Malformed version range expression.
    #[error("syntax error in version range '{input}'")]
    #[diagnostic(help("expected forms like '1.2', '1.2+', '>=1.2,<2.0', '1.2..2.0', '==1.2.3' or unions such as '4|6+'"))]
    InvalidRange { input: String },

    /// A bound whose lower end exceeds its upper end.
    #[error("invalid bound: lower '{lower}' exceeds upper '{upper}'")]
    InvalidBound { lower: String, upper: String },

    /// Malformed package requirement string.
    #[error("invalid requirement '{input}': {reason}")]
    InvalidRequirement { input: String, reason: String },
}
