//! # rowql-core
//!
//! Shared row value model, scalar coercion, operators and error taxonomy for
//! the rowql query engine. Every other `rowql-*` crate depends on this one.

#![deny(unused_imports)]

mod error;
mod operator;
mod path;
mod value;

pub use self::{
    error::Error,
    operator::{CompareOp, JoinKind, LinkOp, SortMode},
    path::{resolve_path, PathMode},
    value::{Row, Value},
};
