use rowql_core::Error;
use rowql_lexer::LexerError;

/// Lifts a lexer failure into the shared error taxonomy. `ParseError`
/// covers both tokenizing and grammar failures (spec §7: "Unknown token /
/// unexpected keyword in SQL").
pub(crate) fn from_lexer(err: LexerError) -> Error {
    Error::Parse(err.to_string())
}

/// Builds a `Parse` error describing an unexpected token.
pub(crate) fn unexpected(expected: impl std::fmt::Display, found: Option<impl std::fmt::Display>) -> Error {
    match found {
        Some(found) => Error::Parse(format!("expected {}, found {}", expected, found)),
        None => Error::Parse(format!("expected {}, found end of input", expected)),
    }
}
