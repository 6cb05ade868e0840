use std::iter::Peekable;
use std::str::Chars;

use crate::error::{LexerError, Location};
use crate::token::{looks_like_function_name, Keyword, Token};

/// Query-text tokenizer.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    location: Location,
    /// Set right after emitting a [`Token::FunctionName`], so the very next
    /// `(` is tokenized as a plain [`Token::LParen`] opening the call's
    /// argument list rather than as a file-query literal.
    last_was_function_name: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            iter: input.chars().peekable(),
            location: Location { line: 1, column: 1 },
            last_was_function_name: false,
        }
    }

    /// The current scan position.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Tokenizes the whole input, skipping whitespace, terminated by a
    /// single trailing [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token == Token::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();
        let was_function_name = std::mem::take(&mut self.last_was_function_name);
        match self.iter.peek().copied() {
            None => Ok(Token::Eof),
            Some('\'') => {
                self.next_char();
                self.tokenize_string_literal()
            }
            Some('(') if was_function_name => {
                self.next_char();
                Ok(Token::LParen)
            }
            Some('(') => {
                self.next_char();
                self.maybe_file_query()
            }
            Some(')') => {
                self.next_char();
                Ok(Token::RParen)
            }
            Some(',') => {
                self.next_char();
                Ok(Token::Comma)
            }
            Some('*') => {
                self.next_char();
                Ok(Token::Star)
            }
            Some('=') => {
                self.next_char();
                Ok(Token::Eq)
            }
            Some('!') => {
                self.next_char();
                if self.next_if_is('=') {
                    Ok(Token::NotEq)
                } else {
                    self.error("expected '=' after '!'")
                }
            }
            Some('<') => {
                self.next_char();
                if self.next_if_is('=') {
                    Ok(Token::LtEq)
                } else {
                    Ok(Token::Lt)
                }
            }
            Some('>') => {
                self.next_char();
                if self.next_if_is('=') {
                    Ok(Token::GtEq)
                } else {
                    Ok(Token::Gt)
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.tokenize_number(),
            Some(ch) if is_ident_start(ch) => self.tokenize_ident_or_keyword(),
            Some(ch) => self.error(format!("unexpected character '{}'", ch)),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.iter.peek() {
            if ch.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn tokenize_string_literal(&mut self) -> Result<Token, LexerError> {
        let mut s = String::new();
        loop {
            match self.next_char() {
                Some('\'') => {
                    if self.next_if_is('\'') {
                        s.push('\'');
                        continue;
                    }
                    return Ok(Token::Str(s));
                }
                Some(ch) => s.push(ch),
                None => return self.error("unterminated string literal"),
            }
        }
    }

    /// Having consumed the opening `(`, reads the balanced-paren contents of
    /// a file-query literal, e.g. `orders.json` in `(orders.json).data`, then
    /// greedily consumes a trailing `.path` if one directly follows the
    /// closing paren with no intervening whitespace, producing one
    /// [`Token::FileQuery`] for the whole construct.
    fn maybe_file_query(&mut self) -> Result<Token, LexerError> {
        let mut inner = String::new();
        let mut depth = 1u32;
        loop {
            match self.next_char() {
                Some('(') => {
                    depth += 1;
                    inner.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    inner.push(')');
                }
                Some(ch) => inner.push(ch),
                None => return self.error("unterminated '(' in file-query literal"),
            }
        }
        let mut literal = format!("({})", inner);
        if self.iter.peek() == Some(&'.') {
            literal.push_str(&self.next_while(|ch| is_path_char(*ch)));
        }
        Ok(Token::FileQuery(literal))
    }

    fn tokenize_number(&mut self) -> Result<Token, LexerError> {
        let mut s = self.next_while(|ch| ch.is_ascii_digit());
        if self.iter.peek() == Some(&'.') {
            s.push('.');
            self.next_char();
            s.push_str(&self.next_while(|ch| ch.is_ascii_digit()));
        }
        if matches!(self.iter.peek(), Some('e') | Some('E')) {
            s.push(self.next_char().expect("peeked"));
            if matches!(self.iter.peek(), Some('+') | Some('-')) {
                s.push(self.next_char().expect("peeked"));
            }
            s.push_str(&self.next_while(|ch| ch.is_ascii_digit()));
        }
        Ok(Token::Number(s))
    }

    fn tokenize_ident_or_keyword(&mut self) -> Result<Token, LexerError> {
        let word = self.next_while(|ch| is_ident_part(*ch));
        if let Some(keyword) = Keyword::lookup(&word) {
            return Ok(Token::Keyword(keyword));
        }
        if self.iter.peek() == Some(&'(') && looks_like_function_name(&word) {
            self.last_was_function_name = true;
            return Ok(Token::FunctionName(word));
        }
        // A bare ident may continue into a dotted/indexed field path.
        if matches!(self.iter.peek(), Some('.') | Some('[') | Some('-')) {
            let rest = self.next_while(|ch| is_path_char(*ch));
            if !rest.is_empty() {
                return Ok(Token::Ident(format!("{}{}", word, rest)));
            }
        }
        Ok(Token::Ident(word))
    }

    fn next_while<F: Fn(&char) -> bool>(&mut self, predicate: F) -> String {
        let mut value = String::new();
        while let Some(&ch) = self.iter.peek() {
            if predicate(&ch) {
                self.next_char();
                value.push(ch);
            } else {
                break;
            }
        }
        value
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        self.location.advance(ch);
        Some(ch)
    }

    fn next_if_is(&mut self, expected: char) -> bool {
        if self.iter.peek() == Some(&expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn error<R>(&self, message: impl Into<String>) -> Result<R, LexerError> {
        Err(self.location.into_error(message))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Characters that can appear in a dotted/indexed field path extension
/// beyond the first identifier segment: `.`, `[`, `]`, `-`, `>`, plus
/// ordinary identifier characters.
fn is_path_char(ch: char) -> bool {
    is_ident_part(ch) || matches!(ch, '.' | '[' | ']' | '-' | '>')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().expect("should tokenize")
    }

    #[test]
    fn tokenizes_a_simple_select() {
        let tokens = tokenize("SELECT name FROM (data.json).items WHERE age >= 18");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Select),
                Token::Ident("name".into()),
                Token::Keyword(Keyword::From),
                Token::FileQuery("(data.json).items".into()),
                Token::Keyword(Keyword::Where),
                Token::Ident("age".into()),
                Token::GtEq,
                Token::Number("18".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_dotted_and_indexed_paths() {
        let tokens = tokenize("a.e[]->z");
        assert_eq!(tokens, vec![Token::Ident("a.e[]->z".into()), Token::Eof]);
    }

    #[test]
    fn tokenizes_function_calls_distinctly_from_idents() {
        let tokens = tokenize("SUM(price)");
        assert_eq!(
            tokens,
            vec![
                Token::FunctionName("SUM".into()),
                Token::LParen,
                Token::Ident("price".into()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lowercase_call_like_text_is_not_a_function_name() {
        let tokens = tokenize("sum(price)");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("sum".into()),
                Token::LParen,
                Token::Ident("price".into()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_string_literal_with_escaped_quote() {
        let tokens = tokenize("'it''s here'");
        assert_eq!(tokens, vec![Token::Str("it's here".into()), Token::Eof]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn tokenizes_numbers_including_float_and_exponent() {
        let tokens = tokenize("1 3.14 1e10 2.5E-3");
        assert_eq!(
            tokens,
            vec![
                Token::Number("1".into()),
                Token::Number("3.14".into()),
                Token::Number("1e10".into()),
                Token::Number("2.5E-3".into()),
                Token::Eof,
            ]
        );
    }
}
