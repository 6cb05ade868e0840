use std::fmt;

/// Defines a fixed keyword set: an enum, its `Display`, and a
/// case-insensitive `from_str` lookup. Trimmed down from the teacher's
/// multi-dialect `define_keyword!` macro to this grammar's single,
/// non-extensible keyword list.
macro_rules! define_keywords {
    ($($variant:ident => $text:expr),* $(,)?) => {
        /// A reserved word of the query grammar.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            /// Looks up a keyword by its text, case-insensitively. Returns
            /// `None` for anything that isn't one of this grammar's
            /// reserved words (i.e. it's a plain identifier).
            pub fn lookup(s: &str) -> Option<Keyword> {
                $(if s.eq_ignore_ascii_case($text) { return Some(Keyword::$variant); })*
                None
            }
        }

        impl fmt::Display for Keyword {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Keyword::$variant => $text),*
                })
            }
        }
    };
}

define_keywords! {
    Select => "SELECT",
    Distinct => "DISTINCT",
    As => "AS",
    From => "FROM",
    Where => "WHERE",
    And => "AND",
    Or => "OR",
    Xor => "XOR",
    Group => "GROUP",
    By => "BY",
    Having => "HAVING",
    Order => "ORDER",
    Asc => "ASC",
    Desc => "DESC",
    Natsort => "NATSORT",
    Shuffle => "SHUFFLE",
    Limit => "LIMIT",
    Offset => "OFFSET",
    Join => "JOIN",
    Inner => "INNER",
    Left => "LEFT",
    On => "ON",
    In => "IN",
    Not => "NOT",
    Like => "LIKE",
    Is => "IS",
    Null => "NULL",
    True => "TRUE",
    False => "FALSE",
}

/// A single lexical token of the query grammar.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// A reserved word.
    Keyword(Keyword),
    /// A bare identifier or dotted/bracketed field path, e.g. `name` or
    /// `a.e[]->z`.
    Ident(String),
    /// An identifier matching `[A-Z0-9_]{2,}` found immediately followed by
    /// `(`, captured distinctly so the parser knows unambiguously that a
    /// function call follows without needing lookahead.
    FunctionName(String),
    /// A decimal integer or float literal, unparsed.
    Number(String),
    /// The contents of a single-quoted string literal, with `''` already
    /// unescaped to `'`.
    Str(String),
    /// A `(selector).path` file-query literal, captured whole.
    FileQuery(String),
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `*`
    Star,
    /// End of input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k),
            Token::Ident(s) => f.write_str(s),
            Token::FunctionName(s) => f.write_str(s),
            Token::Number(s) => f.write_str(s),
            Token::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::FileQuery(s) => f.write_str(s),
            Token::Comma => f.write_str(","),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Eq => f.write_str("="),
            Token::NotEq => f.write_str("!="),
            Token::Lt => f.write_str("<"),
            Token::LtEq => f.write_str("<="),
            Token::Gt => f.write_str(">"),
            Token::GtEq => f.write_str(">="),
            Token::Star => f.write_str("*"),
            Token::Eof => f.write_str("<eof>"),
        }
    }
}

/// True for identifiers matching the function-name convention
/// `[A-Z0-9_]{2,}`: all-uppercase, digits and underscores allowed, at least
/// two characters, not starting or ending with `_`.
pub(crate) fn looks_like_function_name(s: &str) -> bool {
    s.len() >= 2
        && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && !s.starts_with('_')
        && !s.ends_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        assert_eq!(Keyword::lookup("select"), Some(Keyword::Select));
        assert_eq!(Keyword::lookup("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::lookup("selectx"), None);
    }

    #[test]
    fn function_name_convention() {
        assert!(looks_like_function_name("SUM"));
        assert!(looks_like_function_name("GROUP_CONCAT"));
        assert!(!looks_like_function_name("sum"));
        assert!(!looks_like_function_name("S"));
    }

    #[test]
    fn function_name_must_not_start_or_end_with_underscore() {
        assert!(!looks_like_function_name("_AB"));
        assert!(!looks_like_function_name("AB_"));
        assert!(!looks_like_function_name("_"));
        assert!(looks_like_function_name("A_B"));
    }
}
