//! # rowql-lexer
//!
//! Converts rowql query text into a flat token stream for `rowql-parser`.

#![deny(unused_imports)]

mod error;
mod lexer;
mod token;

pub use self::{
    error::{LexerError, Location},
    lexer::Lexer,
    token::{Keyword, Token},
};
