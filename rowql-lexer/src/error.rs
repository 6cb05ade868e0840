use std::fmt;

/// A position in the source query text, 1-indexed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Location {
    /// Line number.
    pub line: u64,
    /// Column number.
    pub column: u64,
}

impl Location {
    pub(crate) fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    pub(crate) fn into_error(self, message: impl Into<String>) -> LexerError {
        LexerError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// An error produced while tokenizing query text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexerError {
    /// Human-readable description.
    pub message: String,
    /// Line the error was found on.
    pub line: u64,
    /// Column the error was found on.
    pub column: u64,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.column)
    }
}

impl std::error::Error for LexerError {}
