//! Common imports for working with rowql: `use rowql::prelude::*;` pulls in
//! the query model, the builder/parser entry points, the execution types,
//! and [`MemorySource`] for tests.

pub use rowql_ast::{Cond, CondValue, FnArg, FunctionCall, Join, JoinSource, Ordering, Query, SelectedField};
pub use rowql_core::{CompareOp, Error, JoinKind, LinkOp, PathMode, Row, SortMode, Value};
pub use rowql_engine::{execute, Results, ResultsState, Source};
pub use rowql_parser::{parse_query, QueryBuilder};

pub use crate::memory::MemorySource;

/// Builds a `Row::Map` from `(key, value)` pairs — a small convenience for
/// constructing test/doctest fixtures without spelling out `IndexMap`.
pub fn row(fields: Vec<(&str, Value)>) -> Row {
    Row::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), Row::Scalar(v)))
            .collect(),
    )
}
