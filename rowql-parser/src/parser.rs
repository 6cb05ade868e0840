use rowql_core::Error;
use rowql_lexer::{Keyword, Lexer, Token};

use crate::error::{from_lexer, unexpected};
use crate::peek::{MultiPeek, PeekIteratorExt};

/// Token-stream cursor with lookahead, shared by the statement grammar in
/// [`crate::grammar`].
pub struct Parser {
    iter: MultiPeek<std::vec::IntoIter<Token>>,
}

impl Parser {
    /// Builds a parser directly from an already-tokenized stream.
    pub fn new_with_tokens(tokens: Vec<Token>) -> Self {
        Parser {
            iter: tokens.into_iter().multipeek(),
        }
    }

    /// Tokenizes `text` and builds a parser over the result.
    pub fn new_with_text(text: &str) -> Result<Self, Error> {
        let tokens = Lexer::new(text).tokenize().map_err(from_lexer)?;
        Ok(Self::new_with_tokens(tokens))
    }

    /// Parses a comma-separated list of one or more items.
    pub fn parse_comma_separated<T>(&mut self, mut f: impl FnMut(&mut Parser) -> Result<T, Error>) -> Result<Vec<T>, Error> {
        let mut values = vec![f(self)?];
        while self.next_token_if_is(&Token::Comma) {
            values.push(f(self)?);
        }
        Ok(values)
    }

    /// Consumes the next token if it's the given keyword; errors otherwise.
    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), Error> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(unexpected(keyword, self.peek_token().cloned()))
        }
    }

    /// Consumes the next token if it's the given keyword, returns whether it matched.
    pub fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        self.next_token_if(|t| matches!(t, Token::Keyword(k) if *k == keyword)).is_some()
    }

    /// Consumes a run of keywords if and only if all of them match in order,
    /// otherwise consumes nothing.
    pub fn parse_keywords(&mut self, keywords: &[Keyword]) -> bool {
        for &keyword in keywords {
            match self.peek_next_token() {
                Some(Token::Keyword(k)) if *k == keyword => {}
                _ => {
                    self.reset_peek_cursor();
                    return false;
                }
            }
        }
        for _ in 0..keywords.len() {
            self.next_token();
        }
        true
    }

    /// Consumes the next token if it equals `expected`, errors otherwise.
    pub fn expect_token(&mut self, expected: &Token) -> Result<(), Error> {
        if self.next_token_if_is(expected) {
            Ok(())
        } else {
            Err(unexpected(expected, self.peek_token().cloned()))
        }
    }

    /// Peeks without consuming.
    pub fn peek_token(&mut self) -> Option<&Token> {
        self.iter.peek()
    }

    /// Peeks further ahead without consuming; resets on the next `next_token()`.
    pub fn peek_next_token(&mut self) -> Option<&Token> {
        self.iter.peek_next()
    }

    /// Resets the lookahead cursor used by `peek_next_token`.
    pub fn reset_peek_cursor(&mut self) {
        self.iter.reset_cursor();
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Option<Token> {
        self.iter.next()
    }

    /// Consumes and returns the next token if `func` accepts it.
    pub fn next_token_if(&mut self, func: impl FnOnce(&Token) -> bool) -> Option<Token> {
        self.iter.next_if(func)
    }

    /// Consumes the next token if it equals `expected`.
    pub fn next_token_if_is(&mut self, expected: &Token) -> bool {
        self.iter.next_if_eq(expected).is_some()
    }

    /// True once the token stream is exhausted.
    pub fn at_end(&mut self) -> bool {
        matches!(self.peek_token(), None | Some(Token::Eof))
    }
}
