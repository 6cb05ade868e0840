//! # rowql-ast
//!
//! The rowql query model: the recursive [`Cond`] condition tree, [`Join`]
//! specs, [`Ordering`], [`SelectedField`] projections, and the [`Query`]
//! data model they compose into. This crate holds data and its canonical
//! `Display` rendering only — the fluent builder lives in `rowql-parser`
//! and the execution engine in `rowql-engine`.

#![deny(unused_imports)]

mod cond;
mod join;
mod like;
mod ordering;
mod query;
mod selected_field;

pub use self::{
    cond::{match_scalar, Cond, CondValue},
    join::{Join, JoinSource},
    ordering::Ordering,
    query::Query,
    selected_field::{FnArg, FunctionCall, SelectedField},
};
