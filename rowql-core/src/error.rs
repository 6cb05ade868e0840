use thiserror::Error;

/// The full rowql error taxonomy (spec §7). Every kind is discriminable by
/// callers — none of them collapse into an opaque string.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Adapter could not open the path.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Adapter could not parse the document.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Unknown token or unexpected keyword while lexing/parsing SQL-like text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Duplicate, empty, or misplaced alias.
    #[error("alias error: {0}")]
    Alias(String),

    /// `on` used without a prior join, or an unknown side key at build time.
    #[error("join error: {0}")]
    Join(String),

    /// Unknown sort mode, or an invalid combination of sort modes.
    #[error("sort error: {0}")]
    Sort(String),

    /// Strict path access to an absent key, or a HAVING reference to a
    /// finalName that was never projected.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A non-numeric value where a numeric one was required, or any other
    /// scalar coercion failure.
    #[error("type error: {0}")]
    Type(String),

    /// Catch-all for internal invariant violations.
    #[error("unexpected value: {0}")]
    Unexpected(String),
}
