//! # rowql
//!
//! rowql is a file-oriented, SQL-like query engine over semi-structured
//! documents. Point it at a JSON/XML/YAML/CSV/config document (or, for
//! tests and examples, an in-memory [`MemorySource`]) and run a query built
//! either from text (via [`parse_query`]) or fluently (via [`QueryBuilder`]):
//!
//! ```
//! use rowql::prelude::*;
//!
//! let source = MemorySource::new(vec![
//!     row(vec![("id", Value::Int(1)), ("name", Value::Str("A".into())), ("price", Value::Int(100))]),
//!     row(vec![("id", Value::Int(2)), ("name", Value::Str("B".into())), ("price", Value::Int(200))]),
//! ]);
//!
//! let query = QueryBuilder::new()
//!     .select_all()
//!     .unwrap()
//!     .from("*")
//!     .r#where("price", CompareOp::Gt, CondValue::Scalar(Value::Int(100)))
//!     .build();
//!
//! let results = Results::new(query, &source);
//! assert_eq!(results.count().unwrap(), 1);
//! ```
//!
//! The crate is split across five smaller crates, re-exported below: the
//! row/value model and error taxonomy (`rowql-core`), the query data model
//! (`rowql-ast`), the tokenizer (`rowql-lexer`), the recursive-descent
//! parser and fluent builder (`rowql-parser`), and the execution engine and
//! `Results` handle (`rowql-engine`). Concrete format adapters for
//! CSV/XML/JSON/YAML/config documents are out of scope for this crate (spec
//! §1 non-goals); bring your own [`Source`] implementation, or use
//! [`MemorySource`] for tests.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod memory;
pub mod prelude;

pub use rowql_ast as ast;
pub use rowql_core as core;
pub use rowql_engine as engine;
pub use rowql_lexer as lexer;
pub use rowql_parser as parser;

pub use self::memory::MemorySource;
pub use rowql_ast::{Cond, CondValue, FnArg, FunctionCall, Join, JoinSource, Ordering, Query, SelectedField};
pub use rowql_core::{resolve_path, CompareOp, Error, JoinKind, LinkOp, PathMode, Row, SortMode, Value};
pub use rowql_engine::{execute, Results, ResultsState, Source};
pub use rowql_parser::{parse_query, QueryBuilder};
