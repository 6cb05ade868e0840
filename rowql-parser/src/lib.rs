//! # rowql-parser
//!
//! Two ways into a [`rowql_ast::Query`]: [`parse_query`] turns the textual
//! grammar (spec §4.5) into one, and [`QueryBuilder`] builds one fluently
//! (spec §4.4). Both share the same `MultiPeek`-driven `Parser` plumbing
//! that `grammar.rs`'s recursive-descent parser rides on.

#![deny(missing_docs)]
#![warn(unused_imports)]

mod builder;
mod error;
mod grammar;
mod parser;
mod peek;

pub use self::{
    builder::QueryBuilder,
    grammar::parse_query,
    parser::Parser,
    peek::{multipeek, MultiPeek, PeekIteratorExt},
};
