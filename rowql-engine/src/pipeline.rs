//! Execution pipeline: scan → join → {where, project, having | group +
//! aggregate + having} → sort → limit/offset (spec §4.6). Every stage is a
//! lazy `Iterator` adapter where the spec allows it; join, group-by and sort
//! each force materialization of their own buffer, which is the only memory
//! cost the design calls for (spec §4.6 "Streaming vs materialization").

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rowql_ast::{match_scalar, CondValue, FnArg, FunctionCall, Join, JoinSource, Ordering, Query, SelectedField};
use rowql_core::{CompareOp, Error, JoinKind, PathMode, Row, SortMode, Value};

use crate::functions;
use crate::source::Source;

/// Compiles and runs `query` against `source`, returning a lazy iterator of
/// result rows (or the error that aborted the row that produced it — spec
/// §7: "errors propagate out of the iterator on the row that provoked
/// them; partial results already yielded remain valid").
pub fn execute<'s>(
    query: &Query,
    source: &'s dyn Source,
) -> Result<Box<dyn Iterator<Item = Result<Row, Error>> + 's>, Error> {
    validate(query)?;

    tracing::debug!(from = ?query.from, joins = query.joins.len(), "scan start");
    let mut joined: Box<dyn Iterator<Item = Row> + 's> = source.stream_rows(query.from.as_deref())?;
    for join in &query.joins {
        joined = apply_join(joined, join, source)?;
    }

    let query = Rc::new(query.clone());
    let has_aggregate = query.selections.iter().any(|f| {
        f.function
            .as_ref()
            .map(|c| functions::is_known_aggregate(&c.name))
            .unwrap_or(false)
    });
    let grouped = !query.group_by.is_empty() || has_aggregate;

    if grouped {
        let rows = execute_grouped(joined, &query)?;
        let rows = apply_sort(rows, &query.order_by)?;
        let rows = apply_limit_offset(rows, query.limit, query.offset);
        return Ok(Box::new(rows.into_iter().map(Ok)));
    }

    if !query.order_by.is_empty() {
        let seen = Rc::new(RefCell::new(HashSet::new()));
        let mut rows = Vec::new();
        for row in joined {
            if let Some(result) = process_row(row, &query, &seen) {
                rows.push(result?);
            }
        }
        let rows = apply_sort(rows, &query.order_by)?;
        let rows = apply_limit_offset(rows, query.limit, query.offset);
        return Ok(Box::new(rows.into_iter().map(Ok)));
    }

    // No sort, no grouping: fully streaming. Limit/offset is pushed into the
    // same lazy chain so scanning can stop as soon as enough rows are
    // produced (spec §4.6 step 5, §8 invariant 3).
    let seen = Rc::new(RefCell::new(HashSet::new()));
    let offset = query.offset.unwrap_or(0) as usize;
    let limit = query.limit;
    let q = query.clone();
    let iter = joined
        .filter_map(move |row| process_row(row, &q, &seen))
        .skip(offset);
    let iter: Box<dyn Iterator<Item = Result<Row, Error>> + 's> = match limit {
        Some(n) => Box::new(iter.take(n as usize)),
        None => Box::new(iter),
    };
    Ok(iter)
}

fn validate(query: &Query) -> Result<(), Error> {
    let shuffle_count = query
        .order_by
        .iter()
        .filter(|o| matches!(o.mode, SortMode::Shuffle))
        .count();
    if shuffle_count > 0 && query.order_by.len() > 1 {
        return Err(Error::Sort(
            "SHUFFLE cannot be combined with other ORDER BY keys".to_string(),
        ));
    }
    Ok(())
}

/// Evaluates WHERE, projects via `SelectedField`s, evaluates HAVING against
/// the projected row, and applies DISTINCT dedup. Returns `None` when the
/// row is filtered out by WHERE/HAVING/DISTINCT, `Some(Err(_))` when an
/// error aborted processing this row, `Some(Ok(row))` otherwise.
fn process_row(row: Row, query: &Query, seen: &Rc<RefCell<HashSet<String>>>) -> Option<Result<Row, Error>> {
    match query.where_cond.evaluate(&row, PathMode::Lenient) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => return Some(Err(e)),
    }

    let projected = match project(&row, &query.selections) {
        Ok(p) => p,
        Err(e) => return Some(Err(e)),
    };

    match query.having_cond.evaluate(&projected, PathMode::Strict) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => return Some(Err(e)),
    }

    if query.distinct {
        let key = match serde_json::to_string(&projected) {
            Ok(s) => s,
            Err(e) => return Some(Err(Error::Unexpected(e.to_string()))),
        };
        if !seen.borrow_mut().insert(key) {
            return None;
        }
    }

    Some(Ok(projected))
}

/// Applies the full `SelectedField` list to `row`, in declaration order, so
/// a function argument referencing an earlier alias (spec §4.3's
/// row-function "partialResult") can see it. `SELECT *` copies every
/// top-level key of a mapping row through unchanged.
fn project(row: &Row, selections: &[SelectedField]) -> Result<Row, Error> {
    if selections.is_empty() {
        return Ok(row.clone());
    }
    let mut result = IndexMap::new();
    for field in selections {
        let value = if field.function.is_none() && field.origin_field == "*" {
            if let Row::Map(map) = row {
                for (k, v) in map {
                    result.insert(k.clone(), v.clone());
                }
            }
            continue;
        } else if let Some(call) = &field.function {
            if functions::is_known_aggregate(&call.name) {
                // The grouped path bakes the aggregate's value into `row`
                // under the call's rendered text before projecting.
                rowql_core::resolve_path(row, &field.origin_field, PathMode::Strict)?
            } else {
                let args = call
                    .args
                    .iter()
                    .map(|arg| resolve_fn_arg(arg, row, &result))
                    .collect::<Result<Vec<_>, _>>()?;
                functions::call_scalar(&call.name, &args)?
            }
        } else {
            rowql_core::resolve_path(row, &field.origin_field, PathMode::Strict)?
        };
        result.insert(field.final_name.clone(), value);
    }
    Ok(Row::Map(result))
}

fn resolve_fn_arg(arg: &FnArg, row: &Row, partial: &IndexMap<String, Row>) -> Result<Row, Error> {
    match arg {
        FnArg::Field(name) => match partial.get(name) {
            Some(v) => Ok(v.clone()),
            None => rowql_core::resolve_path(row, name, PathMode::Lenient),
        },
        FnArg::Literal(v) => Ok(Row::Scalar(v.clone())),
        FnArg::Star => Ok(Row::null()),
    }
}

/// Scan + WHERE + bucket into `groupKey → rows`, then for each group build
/// the aggregated row and run the full projection over it (spec §4.6 step
/// 3b). `groups` preserves first-seen order of group keys (spec §5
/// "Ordering" item c), and an aggregate-only query with no GROUP BY always
/// gets exactly one group keyed `"*"`, even if zero rows pass WHERE — the
/// same "COUNT(*) over nothing is 0, not absent" contract SQL aggregates
/// give.
fn execute_grouped(rows: impl Iterator<Item = Row>, query: &Query) -> Result<Vec<Row>, Error> {
    let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
    if query.group_by.is_empty() {
        groups.insert("*".to_string(), Vec::new());
    }

    for row in rows {
        if !query.where_cond.evaluate(&row, PathMode::Lenient)? {
            continue;
        }
        let key = group_key(&row, &query.group_by)?;
        groups.entry(key).or_default().push(row);
    }
    tracing::debug!(group_count = groups.len(), "group map finalized");

    let mut out = Vec::with_capacity(groups.len());
    for (_, members) in groups {
        let base = members
            .first()
            .cloned()
            .unwrap_or_else(|| Row::Map(IndexMap::new()));
        let mut working = match base {
            Row::Map(map) => map,
            _ => IndexMap::new(),
        };
        for field in &query.selections {
            if let Some(call) = &field.function {
                if functions::is_known_aggregate(&call.name) {
                    let value = aggregate_value(call, &members)?;
                    working.insert(field.origin_field.clone(), Row::Scalar(value));
                }
            }
        }
        let working_row = Row::Map(working);
        let projected = project(&working_row, &query.selections)?;
        if query.having_cond.evaluate(&projected, PathMode::Strict)? {
            out.push(projected);
        }
    }
    Ok(out)
}

fn group_key(row: &Row, group_by: &[String]) -> Result<String, Error> {
    if group_by.is_empty() {
        return Ok("*".to_string());
    }
    let mut parts = Vec::with_capacity(group_by.len());
    for field in group_by {
        let resolved = rowql_core::resolve_path(row, field, PathMode::Lenient)?;
        let text = resolved.as_scalar().map(|v| v.coerce_string()).unwrap_or_default();
        parts.push(text);
    }
    Ok(parts.join("|"))
}

/// Evaluates an aggregate `FunctionCall` over an entire group. The call's
/// first argument names the field (or is `*` for `COUNT(*)`); any further
/// arguments are per-call configuration (GROUP_CONCAT's separator, AVG's
/// decimal places, ...), not additional fields.
fn aggregate_value(call: &FunctionCall, group: &[Row]) -> Result<Value, Error> {
    let Some(first) = call.args.first() else {
        return Err(Error::Type(format!(
            "{} requires at least one argument",
            call.name
        )));
    };
    let mut is_star = false;
    let mut values = Vec::with_capacity(group.len());
    match first {
        FnArg::Star => is_star = true,
        FnArg::Field(name) => {
            for row in group {
                values.push(rowql_core::resolve_path(row, name, PathMode::Lenient)?);
            }
        }
        FnArg::Literal(v) => {
            values.extend(std::iter::repeat(Row::Scalar(v.clone())).take(group.len()));
        }
    }
    let extra: Vec<Row> = call.args[1..]
        .iter()
        .map(|arg| match arg {
            FnArg::Literal(v) => Row::Scalar(v.clone()),
            FnArg::Field(name) => Row::Scalar(Value::Str(name.clone())),
            FnArg::Star => Row::null(),
        })
        .collect();
    functions::call_aggregate(&call.name, &values, &extra, group.len(), is_star)
}

/// Materializes the right side of a join into a lookup, then returns a lazy
/// iterator over the left side that expands each left row into its
/// cartesian of right matches (spec §4.6 step 2). Forces the right side to
/// be fully consumed once; the left side stays streaming.
fn apply_join<'s>(
    left: Box<dyn Iterator<Item = Row> + 's>,
    join: &Join,
    source: &'s dyn Source,
) -> Result<Box<dyn Iterator<Item = Row> + 's>, Error> {
    let right_rows: Vec<Row> = match &join.right {
        JoinSource::Selector(selector) => source.stream_rows(Some(selector))?.collect(),
        JoinSource::Query(nested) => execute(nested, source)?.collect::<Result<Vec<_>, _>>()?,
    };
    tracing::debug!(right_rows = right_rows.len(), kind = ?join.kind, "join build side materialized");

    let schema: Option<Vec<String>> = right_rows
        .first()
        .and_then(|r| r.as_map())
        .map(|m| m.keys().cloned().collect());

    let op = join.op;
    let mut by_key: IndexMap<String, Vec<usize>> = IndexMap::new();
    if matches!(op, CompareOp::Eq) {
        for (i, row) in right_rows.iter().enumerate() {
            let key = resolve_join_key(row, &join.right_key);
            by_key.entry(key).or_default().push(i);
        }
    }

    let alias = join.alias.clone();
    let left_key = join.left_key.clone();
    let right_key = join.right_key.clone();
    let kind = join.kind;
    // Tracks which right rows were ever used as a match, for statistics
    // only (spec §4.6 step 2): it never suppresses a later match.
    let used: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());

    let iter = left.flat_map(move |lrow| {
        let lscalar = resolve_join_scalar(&lrow, &left_key);
        let mut matched: Vec<&Row> = Vec::new();
        if matches!(op, CompareOp::Eq) {
            if let Some(indices) = by_key.get(&lscalar.coerce_string()) {
                for &i in indices {
                    used.borrow_mut().insert(i);
                    matched.push(&right_rows[i]);
                }
            }
        } else {
            for (i, rrow) in right_rows.iter().enumerate() {
                let rscalar = resolve_join_scalar(rrow, &right_key);
                let is_match = match_scalar(op, &lscalar, &CondValue::Scalar(rscalar), &right_key).unwrap_or(false);
                if is_match {
                    used.borrow_mut().insert(i);
                    matched.push(rrow);
                }
            }
        }

        if matched.is_empty() {
            match kind {
                JoinKind::Inner => Vec::new(),
                JoinKind::Left => match &schema {
                    Some(keys) => {
                        let placeholder = Row::Map(keys.iter().map(|k| (k.clone(), Row::null())).collect());
                        vec![merge_rows(&lrow, &placeholder, alias.as_deref())]
                    }
                    // Right side yielded zero rows entirely: its schema is
                    // unknown, so emit the left row with nothing merged in
                    // (SPEC_FULL.md open-question decision 2).
                    None => vec![lrow.clone()],
                },
            }
        } else {
            matched
                .into_iter()
                .map(|rrow| merge_rows(&lrow, rrow, alias.as_deref()))
                .collect()
        }
    });
    Ok(Box::new(iter))
}

fn resolve_join_key(row: &Row, path: &str) -> String {
    resolve_join_scalar(row, path).coerce_string()
}

fn resolve_join_scalar(row: &Row, path: &str) -> Value {
    rowql_core::resolve_path(row, path, PathMode::Lenient)
        .ok()
        .and_then(|r| r.as_scalar().cloned())
        .unwrap_or(Value::Null)
}

/// Merges a matched right row into a left row: nested under `alias` if one
/// was given, otherwise flattened into the left row's top-level keys.
fn merge_rows(left: &Row, right: &Row, alias: Option<&str>) -> Row {
    match (left, alias) {
        (Row::Map(lm), Some(alias)) => {
            let mut merged = lm.clone();
            merged.insert(alias.to_string(), right.clone());
            Row::Map(merged)
        }
        (Row::Map(lm), None) => {
            let mut merged = lm.clone();
            if let Row::Map(rm) = right {
                for (k, v) in rm {
                    merged.insert(k.clone(), v.clone());
                }
            }
            Row::Map(merged)
        }
        _ => left.clone(),
    }
}

/// Sorts a fully materialized row buffer per spec §4.6 step 4: later
/// `Ordering` entries act as secondary keys, nulls sort least, `NATSORT`
/// compares digit runs numerically, and `SHUFFLE` (validated elsewhere to be
/// the sole ordering) randomizes instead of comparing.
fn apply_sort(mut rows: Vec<Row>, orderings: &[Ordering]) -> Result<Vec<Row>, Error> {
    if orderings.is_empty() {
        return Ok(rows);
    }
    if orderings.iter().any(|o| matches!(o.mode, SortMode::Shuffle)) {
        let mut rng = rand::rngs::SmallRng::from_entropy();
        rows.shuffle(&mut rng);
        return Ok(rows);
    }
    rows.sort_by(|a, b| {
        for ordering in orderings {
            let av = resolve_join_scalar(a, &ordering.field);
            let bv = resolve_join_scalar(b, &ordering.field);
            let ord = match ordering.mode {
                SortMode::Asc => rowql_core::compare_values(&av, &bv),
                SortMode::Desc => rowql_core::compare_values(&bv, &av),
                SortMode::NatSort => natural_compare(&av.coerce_string(), &bv.coerce_string()),
                SortMode::Shuffle => unreachable!("handled above"),
            };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
    Ok(rows)
}

/// Natural-order string compare: digit runs compare by numeric value,
/// non-digit runs compare byte-wise.
fn natural_compare(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                match na.cmp(&nb) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            (Some(ca), Some(cb)) => {
                ai.next();
                bi.next();
                match ca.cmp(&cb) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
        }
    }
}

fn take_digits(iter: &mut std::iter::Peekable<std::str::Chars>) -> u128 {
    let mut digits = String::new();
    while let Some(&ch) = iter.peek() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            iter.next();
        } else {
            break;
        }
    }
    digits.parse().unwrap_or(0)
}

fn apply_limit_offset(mut rows: Vec<Row>, limit: Option<u64>, offset: Option<u64>) -> Vec<Row> {
    let offset = offset.unwrap_or(0) as usize;
    if offset >= rows.len() {
        return Vec::new();
    }
    rows.drain(0..offset);
    if let Some(limit) = limit {
        rows.truncate(limit as usize);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowql_core::{CompareOp, JoinKind, LinkOp, Value};

    struct MemSource {
        tables: IndexMap<String, Vec<Row>>,
    }

    impl MemSource {
        fn new(tables: Vec<(&str, Vec<Row>)>) -> Self {
            MemSource {
                tables: tables.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            }
        }
    }

    impl Source for MemSource {
        fn stream_rows(&self, selector: Option<&str>) -> Result<Box<dyn Iterator<Item = Row> + '_>, Error> {
            let key = selector.unwrap_or("*");
            let rows = self
                .tables
                .get(key)
                .ok_or_else(|| Error::FileNotFound(key.to_string()))?;
            Ok(Box::new(rows.clone().into_iter()))
        }

        fn source_label(&self) -> String {
            "[mem](test)".to_string()
        }
    }

    fn obj(pairs: Vec<(&str, Value)>) -> Row {
        Row::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), Row::Scalar(v))).collect())
    }

    fn products() -> Vec<Row> {
        vec![
            obj(vec![("id", Value::Int(1)), ("name", Value::Str("A".into())), ("price", Value::Int(100))]),
            obj(vec![("id", Value::Int(2)), ("name", Value::Str("B".into())), ("price", Value::Int(200))]),
            obj(vec![("id", Value::Int(3)), ("name", Value::Str("C".into())), ("price", Value::Int(300))]),
            obj(vec![("id", Value::Int(4)), ("name", Value::Str("D".into())), ("price", Value::Int(400))]),
        ]
    }

    #[test]
    fn simple_filter_streams_in_source_order() {
        let source = MemSource::new(vec![("products", products())]);
        let mut query = Query::new();
        query.from = Some("products".to_string());
        query.where_cond.add_leaf(
            LinkOp::And,
            "price",
            CompareOp::Gt,
            CondValue::Scalar(Value::Int(100)),
        );

        let rows: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        pretty_assertions::assert_eq!(
            rows[0],
            obj(vec![("id", Value::Int(2)), ("name", Value::Str("B".into())), ("price", Value::Int(200))])
        );
    }

    #[test]
    fn having_only_sees_projected_fields() {
        let source = MemSource::new(vec![("products", products())]);
        let mut query = Query::new();
        query.from = Some("products".to_string());
        query.selections.push(SelectedField::field("name"));
        query.where_cond.add_leaf(
            LinkOp::And,
            "price",
            CompareOp::Eq,
            CondValue::Scalar(Value::Int(100)),
        );

        let mut results = execute(&query, &source).unwrap();
        let row = results.next().unwrap().unwrap();
        assert_eq!(rowql_core::resolve_path(&row, "name", PathMode::Strict).unwrap(), Row::Scalar(Value::Str("A".into())));
        assert!(rowql_core::resolve_path(&row, "price", PathMode::Strict).is_err());
    }

    #[test]
    fn group_by_with_having_and_order() {
        let rows = vec![
            obj(vec![("cat", Value::Str("x".into())), ("price", Value::Int(300))]),
            obj(vec![("cat", Value::Str("x".into())), ("price", Value::Int(300))]),
            obj(vec![("cat", Value::Str("y".into())), ("price", Value::Int(100))]),
        ];
        let source = MemSource::new(vec![("items", rows)]);
        let mut query = Query::new();
        query.from = Some("items".to_string());
        query.selections.push(SelectedField::field("cat").with_alias("category"));
        query.selections.push(SelectedField::function(FunctionCall {
            name: "SUM".to_string(),
            args: vec![FnArg::Field("price".to_string())],
        }).with_alias("total"));
        query.group_by.push("cat".to_string());
        query.having_cond.add_leaf(
            LinkOp::And,
            "total",
            CompareOp::Gt,
            CondValue::Scalar(Value::Int(500)),
        );
        query.order_by.push(Ordering { field: "total".to_string(), mode: SortMode::Desc });

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(
            rowql_core::resolve_path(&out[0], "total", PathMode::Strict).unwrap(),
            Row::Scalar(Value::Int(600))
        );
        assert_eq!(
            rowql_core::resolve_path(&out[0], "category", PathMode::Strict).unwrap(),
            Row::Scalar(Value::Str("x".into()))
        );
    }

    #[test]
    fn inner_join_expands_matches_then_having_and_sort_apply() {
        let users = vec![
            obj(vec![("id", Value::Int(1)), ("name", Value::Str("A".into()))]),
            obj(vec![("id", Value::Int(2)), ("name", Value::Str("B".into()))]),
        ];
        let orders = vec![
            obj(vec![("id", Value::Int(10)), ("user_id", Value::Int(1)), ("total", Value::Int(150))]),
            obj(vec![("id", Value::Int(11)), ("user_id", Value::Int(1)), ("total", Value::Int(250))]),
            obj(vec![("id", Value::Int(12)), ("user_id", Value::Int(3)), ("total", Value::Int(300))]),
        ];
        let source = MemSource::new(vec![("users", users), ("orders", orders)]);

        let mut query = Query::new();
        query.from = Some("users".to_string());
        query.selections.push(SelectedField::field("id"));
        query.selections.push(SelectedField::field("name"));
        query.selections.push(SelectedField::field("o.id").with_alias("orderId"));
        query.selections.push(SelectedField::field("o.total").with_alias("totalPrice"));
        query.joins.push(Join {
            right: JoinSource::Selector("orders".to_string()),
            alias: Some("o".to_string()),
            left_key: "id".to_string(),
            right_key: "user_id".to_string(),
            op: CompareOp::Eq,
            kind: JoinKind::Inner,
        });
        query.having_cond.add_leaf(
            LinkOp::And,
            "totalPrice",
            CompareOp::Gt,
            CondValue::Scalar(Value::Int(200)),
        );
        query.order_by.push(Ordering { field: "totalPrice".to_string(), mode: SortMode::Desc });

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(
            rowql_core::resolve_path(&out[0], "orderId", PathMode::Strict).unwrap(),
            Row::Scalar(Value::Int(11))
        );
    }

    #[test]
    fn left_join_emits_unmatched_rows_with_zero_filled_schema() {
        let users = vec![obj(vec![("id", Value::Int(9)), ("name", Value::Str("Z".into()))])];
        let orders = vec![obj(vec![("id", Value::Int(1)), ("user_id", Value::Int(1)), ("total", Value::Int(10))])];
        let source = MemSource::new(vec![("users", users), ("orders", orders)]);

        let mut query = Query::new();
        query.from = Some("users".to_string());
        query.joins.push(Join {
            right: JoinSource::Selector("orders".to_string()),
            alias: Some("o".to_string()),
            left_key: "id".to_string(),
            right_key: "user_id".to_string(),
            op: CompareOp::Eq,
            kind: JoinKind::Left,
        });

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(out.len(), 1);
        let nested = rowql_core::resolve_path(&out[0], "o.total", PathMode::Strict).unwrap();
        assert_eq!(nested, Row::null());
    }

    #[test]
    fn distinct_dedups_projected_rows() {
        let rows = vec![
            obj(vec![("cat", Value::Str("x".into()))]),
            obj(vec![("cat", Value::Str("x".into()))]),
            obj(vec![("cat", Value::Str("y".into()))]),
        ];
        let source = MemSource::new(vec![("items", rows)]);
        let mut query = Query::new();
        query.from = Some("items".to_string());
        query.distinct = true;
        query.selections.push(SelectedField::field("cat"));

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn limit_offset_windows_the_stream() {
        let source = MemSource::new(vec![("products", products())]);
        let mut query = Query::new();
        query.from = Some("products".to_string());
        query.limit = Some(1);
        query.offset = Some(2);

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(
            rowql_core::resolve_path(&out[0], "id", PathMode::Strict).unwrap(),
            Row::Scalar(Value::Int(3))
        );
    }

    #[test]
    fn shuffle_combined_with_other_keys_is_rejected() {
        let source = MemSource::new(vec![("products", products())]);
        let mut query = Query::new();
        query.from = Some("products".to_string());
        query.order_by.push(Ordering { field: "price".to_string(), mode: SortMode::Asc });
        query.order_by.push(Ordering { field: "id".to_string(), mode: SortMode::Shuffle });

        let err = execute(&query, &source).unwrap_err();
        assert!(matches!(err, Error::Sort(_)));
    }

    #[test]
    fn path_extraction_maps_over_sequence() {
        let mut e0 = IndexMap::new();
        e0.insert("z".to_string(), Row::Scalar(Value::Int(3)));
        let mut e1 = IndexMap::new();
        e1.insert("z".to_string(), Row::Scalar(Value::Int(4)));
        let mut e2 = IndexMap::new();
        e2.insert("z".to_string(), Row::Scalar(Value::Int(5)));
        let mut a = IndexMap::new();
        a.insert("e".to_string(), Row::Seq(vec![Row::Map(e0), Row::Map(e1), Row::Map(e2)]));
        let row = Row::Map(a);

        let source = MemSource::new(vec![("rows", vec![row])]);
        let mut query = Query::new();
        query.from = Some("rows".to_string());
        query.selections.push(SelectedField::field("e[]->z").with_alias("zs"));

        let out: Vec<Row> = execute(&query, &source).unwrap().map(Result::unwrap).collect();
        pretty_assertions::assert_eq!(
            rowql_core::resolve_path(&out[0], "zs", PathMode::Strict).unwrap(),
            Row::Seq(vec![Row::Scalar(Value::Int(3)), Row::Scalar(Value::Int(4)), Row::Scalar(Value::Int(5))])
        );
    }
}
