//! The `Results` handle (spec §4.7): a re-iterable façade over a compiled
//! query plus its source, with per-field aggregate scalars memoized after
//! their first full iteration (spec §4.7, §5 "Aggregate caches are
//! memoized across calls on the same Results handle and are stable").

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use rowql_ast::Query;
use rowql_core::{Error, PathMode, Row, Value};

use crate::functions;
use crate::pipeline;
use crate::source::Source;

/// Lifecycle of a [`Results`] handle (spec §4.7): `Fresh` until the first
/// pull, `Iterating` while a pipeline run is in flight, `Exhausted` once one
/// has run to completion (or errored) — a later call rebuilds the pipeline
/// from scratch rather than resuming it (spec §4.7 "re-call... from
/// Exhausted re-enters Iterating by rebuilding the pipeline").
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResultsState {
    /// No pull has happened yet.
    Fresh,
    /// A pipeline run is currently being driven.
    Iterating,
    /// The last pipeline run reached its end (or its first error).
    Exhausted,
}

/// Encapsulates a compiled [`Query`] and the [`Source`] it scans. Every
/// fetch/aggregate method rebuilds and re-runs the execution pipeline —
/// re-iteration is not memoized, only the scalar aggregate results are
/// (spec §3 "Results": "re-iteration re-runs the pipeline unless a cached
/// materialized form exists").
pub struct Results<'a> {
    query: Query,
    source: &'a dyn Source,
    state: Cell<ResultsState>,
    count: Cell<Option<u64>>,
    aggregates: RefCell<IndexMap<String, Value>>,
}

impl<'a> Results<'a> {
    /// Wraps a compiled query and the source it will scan.
    pub fn new(query: Query, source: &'a dyn Source) -> Self {
        Results {
            query,
            source,
            state: Cell::new(ResultsState::Fresh),
            count: Cell::new(None),
            aggregates: RefCell::new(IndexMap::new()),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ResultsState {
        self.state.get()
    }

    fn run(&self) -> Result<Box<dyn Iterator<Item = Result<Row, Error>> + '_>, Error> {
        self.state.set(ResultsState::Iterating);
        pipeline::execute(&self.query, self.source)
    }

    /// Runs the pipeline to completion and returns every row. Spec §4.7
    /// `fetchAll()`.
    pub fn fetch_all(&self) -> Result<Vec<Row>, Error> {
        let iter = self.run()?;
        let mut out = Vec::new();
        for item in iter {
            match item {
                Ok(row) => out.push(row),
                Err(e) => return Err(e),
            }
        }
        self.state.set(ResultsState::Exhausted);
        Ok(out)
    }

    /// The first row, or `None` if the query produced no rows. Spec §4.7
    /// `fetch()`.
    pub fn fetch(&self) -> Result<Option<Row>, Error> {
        let mut iter = self.run()?;
        let first = iter.next().transpose();
        self.state.set(ResultsState::Exhausted);
        first
    }

    /// The first row's value at `field`. Spec §4.7 `fetchSingle(field)`:
    /// raises [`Error::MissingField`] if the query yields no rows, or if
    /// `field` wasn't projected.
    pub fn fetch_single(&self, field: &str) -> Result<Row, Error> {
        let row = self
            .fetch()?
            .ok_or_else(|| Error::MissingField(format!("no rows (looking for '{}')", field)))?;
        rowql_core::resolve_path(&row, field, PathMode::Strict)
    }

    /// True iff [`Self::count`] is greater than zero.
    pub fn exists(&self) -> Result<bool, Error> {
        Ok(self.count()? > 0)
    }

    /// The number of rows the query produces, cached after the first full
    /// iteration.
    pub fn count(&self) -> Result<u64, Error> {
        if let Some(n) = self.count.get() {
            return Ok(n);
        }
        let n = self.fetch_all()?.len() as u64;
        self.count.set(Some(n));
        Ok(n)
    }

    /// `SUM(field)` over every row, cached per field.
    pub fn sum(&self, field: &str) -> Result<Value, Error> {
        self.cached_aggregate("sum", field, &[])
    }

    /// `AVG(field)` over every row, rounded to `decimals` places (spec
    /// §4.3 default 2), cached per field+decimals.
    pub fn avg(&self, field: &str, decimals: i64) -> Result<Value, Error> {
        self.cached_aggregate("avg", field, &[Row::Scalar(Value::Int(decimals))])
    }

    /// `MIN(field)` over every row, cached per field.
    pub fn min(&self, field: &str) -> Result<Value, Error> {
        self.cached_aggregate("min", field, &[])
    }

    /// `MAX(field)` over every row, cached per field.
    pub fn max(&self, field: &str) -> Result<Value, Error> {
        self.cached_aggregate("max", field, &[])
    }

    fn cached_aggregate(&self, op: &str, field: &str, extra: &[Row]) -> Result<Value, Error> {
        let cache_key = format!("{}:{}:{:?}", op, field, extra);
        if let Some(v) = self.aggregates.borrow().get(&cache_key) {
            return Ok(v.clone());
        }
        let rows = self.fetch_all()?;
        let values = rows
            .iter()
            .map(|row| rowql_core::resolve_path(row, field, PathMode::Lenient))
            .collect::<Result<Vec<_>, _>>()?;
        let name = match op {
            "sum" => "SUM",
            "avg" => "AVG",
            "min" => "MIN",
            "max" => "MAX",
            other => return Err(Error::Unexpected(format!("unknown aggregate cache op '{}'", other))),
        };
        let value = functions::call_aggregate(name, &values, extra, rows.len(), false)?;
        self.aggregates.borrow_mut().insert(cache_key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowql_ast::{CondValue, SelectedField};
    use rowql_core::{CompareOp, LinkOp, Value};

    struct MemSource(Vec<Row>);

    impl Source for MemSource {
        fn stream_rows(&self, _selector: Option<&str>) -> Result<Box<dyn Iterator<Item = Row> + '_>, Error> {
            Ok(Box::new(self.0.clone().into_iter()))
        }

        fn source_label(&self) -> String {
            "[mem](test)".to_string()
        }
    }

    fn obj(pairs: Vec<(&str, Value)>) -> Row {
        Row::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), Row::Scalar(v))).collect())
    }

    #[test]
    fn fetch_single_on_missing_field_errors() {
        let source = MemSource(vec![obj(vec![("name", Value::Str("A".into())), ("price", Value::Int(100))])]);
        let mut query = Query::new();
        query.selections.push(SelectedField::field("name"));
        query.where_cond.add_leaf(
            LinkOp::And,
            "price",
            CompareOp::Eq,
            CondValue::Scalar(Value::Int(100)),
        );
        let results = Results::new(query, &source);

        assert_eq!(
            results.fetch_single("name").unwrap(),
            Row::Scalar(Value::Str("A".into()))
        );
        assert!(matches!(
            results.fetch_single("price").unwrap_err(),
            rowql_core::Error::MissingField(_)
        ));
    }

    #[test]
    fn aggregates_are_cached_across_calls() {
        let source = MemSource(vec![
            obj(vec![("price", Value::Int(100))]),
            obj(vec![("price", Value::Int(200))]),
            obj(vec![("price", Value::Int(300))]),
        ]);
        let results = Results::new(Query::new(), &source);

        assert_eq!(results.sum("price").unwrap(), Value::Int(600));
        assert_eq!(results.sum("price").unwrap(), Value::Int(600));
        assert_eq!(results.avg("price", 2).unwrap(), Value::Float(200.0));
        assert_eq!(results.min("price").unwrap(), Value::Int(100));
        assert_eq!(results.max("price").unwrap(), Value::Int(300));
        assert_eq!(results.count().unwrap(), 3);
        assert!(results.exists().unwrap());
        assert_eq!(results.state(), ResultsState::Exhausted);
    }

    #[test]
    fn avg_cache_is_keyed_by_decimals_too() {
        let source = MemSource(vec![
            obj(vec![("price", Value::Int(1))]),
            obj(vec![("price", Value::Int(2))]),
            obj(vec![("price", Value::Int(2))]),
        ]);
        let results = Results::new(Query::new(), &source);

        assert_eq!(results.avg("price", 2).unwrap(), Value::Float(1.67));
        // A second call with a different `decimals` must recompute rather
        // than return the first call's cached rounding.
        assert_eq!(results.avg("price", 4).unwrap(), Value::Float(1.6667));
    }

    #[test]
    fn fresh_state_before_any_pull() {
        let source = MemSource(vec![]);
        let results = Results::new(Query::new(), &source);
        assert_eq!(results.state(), ResultsState::Fresh);
        assert!(!results.exists().unwrap());
    }
}
