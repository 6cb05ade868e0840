//! The fluent [`QueryBuilder`] (spec §4.4): the programmatic counterpart to
//! [`crate::grammar::parse_query`]'s textual surface. Both produce the same
//! [`Query`] data model, so anything expressible in one is expressible in
//! the other (spec §8 invariant 1's round-trip property).

use rowql_ast::{Cond, CondValue, FnArg, FunctionCall, Join, JoinSource, Ordering, Query, SelectedField};
use rowql_core::{CompareOp, Error, JoinKind, LinkOp, SortMode, Value};
use rowql_engine::{Results, Source};

/// Which condition tree `and`/`or`/`xor`/`whereGroup`/`endGroup` currently
/// operate on. Set by `where_`/`having` and left in place until the other
/// one is called, mirroring how a real SQL statement reads top to bottom.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum CondTarget {
    Where,
    Having,
}

/// Builds a [`Query`] one fluent call at a time. Spec §4.4's invariants are
/// enforced here rather than left to `Query`'s plain data: duplicate/empty/
/// misplaced aliases and `on()` without a prior join both raise errors
/// immediately instead of producing an inconsistent `Query`.
pub struct QueryBuilder {
    query: Query,
    target: CondTarget,
    where_path: Vec<usize>,
    having_path: Vec<usize>,
    last_selection: Option<usize>,
    pending_join: Option<(JoinSource, Option<String>, JoinKind)>,
}

impl QueryBuilder {
    /// Starts a new, empty query.
    pub fn new() -> Self {
        QueryBuilder {
            query: Query::new(),
            target: CondTarget::Where,
            where_path: Vec::new(),
            having_path: Vec::new(),
            last_selection: None,
            pending_join: None,
        }
    }

    // ---- projections ----------------------------------------------------

    /// `select("a, b, c")`: adds one plain-field projection per
    /// comma-separated name.
    pub fn select(mut self, csv: &str) -> Result<Self, Error> {
        for name in csv.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self = self.push_selection(SelectedField::field(name))?;
        }
        Ok(self)
    }

    /// `SELECT *`.
    pub fn select_all(mut self) -> Result<Self, Error> {
        self = self.push_selection(SelectedField::star())?;
        Ok(self)
    }

    /// Adds an arbitrary function-call projection, e.g.
    /// `.call("SUM", vec![FnArg::Field("price".into())])`. The named
    /// convenience methods below (`upper`, `sum`, ...) are sugar over this.
    pub fn call(mut self, name: &str, args: Vec<FnArg>) -> Result<Self, Error> {
        let call = FunctionCall {
            name: name.to_string(),
            args,
        };
        self = self.push_selection(SelectedField::function(call))?;
        Ok(self)
    }

    /// `UPPER(field)`.
    pub fn upper(self, field: &str) -> Result<Self, Error> {
        self.call("UPPER", vec![FnArg::Field(field.to_string())])
    }

    /// `LOWER(field)`.
    pub fn lower(self, field: &str) -> Result<Self, Error> {
        self.call("LOWER", vec![FnArg::Field(field.to_string())])
    }

    /// `SUM(field)`.
    pub fn sum(self, field: &str) -> Result<Self, Error> {
        self.call("SUM", vec![FnArg::Field(field.to_string())])
    }

    /// `AVG(field)`.
    pub fn avg(self, field: &str) -> Result<Self, Error> {
        self.call("AVG", vec![FnArg::Field(field.to_string())])
    }

    /// `MIN(field)`.
    pub fn min(self, field: &str) -> Result<Self, Error> {
        self.call("MIN", vec![FnArg::Field(field.to_string())])
    }

    /// `MAX(field)`.
    pub fn max(self, field: &str) -> Result<Self, Error> {
        self.call("MAX", vec![FnArg::Field(field.to_string())])
    }

    /// `COUNT(field)`.
    pub fn count(self, field: &str) -> Result<Self, Error> {
        self.call("COUNT", vec![FnArg::Field(field.to_string())])
    }

    /// `COUNT(*)`.
    pub fn count_all(self) -> Result<Self, Error> {
        self.call("COUNT", vec![FnArg::Star])
    }

    /// `GROUP_CONCAT(field, separator)`.
    pub fn group_concat(self, field: &str, separator: &str) -> Result<Self, Error> {
        self.call(
            "GROUP_CONCAT",
            vec![FnArg::Field(field.to_string()), FnArg::Literal(Value::Str(separator.to_string()))],
        )
    }

    /// Attaches an alias to the most recently added projection. Spec §3:
    /// "An alias may only be attached to the most recently added
    /// projection, exactly once"; duplicates or empty aliases raise
    /// [`Error::Alias`].
    pub fn r#as(mut self, alias: &str) -> Result<Self, Error> {
        if alias.is_empty() {
            return Err(Error::Alias("alias must not be empty".to_string()));
        }
        let index = self
            .last_selection
            .ok_or_else(|| Error::Alias("`as` has no preceding projection to alias".to_string()))?;
        if self.query.selections[index].is_alias {
            return Err(Error::Alias("a projection may only be aliased once".to_string()));
        }
        if self
            .query
            .selections
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.final_name == alias)
        {
            return Err(Error::Alias(format!("alias '{}' is already in use", alias)));
        }
        let field = self.query.selections[index].clone().with_alias(alias);
        self.query.selections[index] = field;
        Ok(self)
    }

    /// `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    fn push_selection(mut self, field: SelectedField) -> Result<Self, Error> {
        if self.query.selections.iter().any(|f| f.final_name == field.final_name) {
            return Err(Error::Alias(format!(
                "'{}' is already a projected field",
                field.final_name
            )));
        }
        self.query.selections.push(field);
        self.last_selection = Some(self.query.selections.len() - 1);
        Ok(self)
    }

    // ---- source -----------------------------------------------------------

    /// `FROM path` — a file-query literal or bare selector.
    pub fn from(mut self, path: &str) -> Self {
        self.query.from = Some(path.to_string());
        self
    }

    // ---- joins --------------------------------------------------------

    /// Opens an `INNER JOIN`; must be followed by [`Self::on`].
    pub fn inner_join(mut self, right: &str, alias: &str) -> Self {
        self.pending_join = Some((JoinSource::Selector(right.to_string()), Some(alias.to_string()), JoinKind::Inner));
        self
    }

    /// Opens a `LEFT JOIN`; must be followed by [`Self::on`].
    pub fn left_join(mut self, right: &str, alias: &str) -> Self {
        self.pending_join = Some((JoinSource::Selector(right.to_string()), Some(alias.to_string()), JoinKind::Left));
        self
    }

    /// Completes the join opened by [`Self::inner_join`]/[`Self::left_join`].
    /// Spec §4.4: "`on` is only valid immediately after a join call;
    /// otherwise JoinError."
    pub fn on(mut self, left_key: &str, op: CompareOp, right_key: &str) -> Result<Self, Error> {
        let (right, alias, kind) = self
            .pending_join
            .take()
            .ok_or_else(|| Error::Join("`on` called without a preceding join".to_string()))?;
        self.query.joins.push(Join {
            right,
            alias,
            left_key: left_key.to_string(),
            right_key: right_key.to_string(),
            op,
            kind,
        });
        Ok(self)
    }

    // ---- conditions -----------------------------------------------------

    /// Opens `WHERE`, adding the first leaf of the root group.
    pub fn r#where(mut self, field: &str, op: CompareOp, value: CondValue) -> Self {
        self.target = CondTarget::Where;
        self.where_path.clear();
        self.add_leaf(LinkOp::And, field, op, value);
        self
    }

    /// Opens `HAVING`, adding the first leaf of the root group.
    pub fn having(mut self, field: &str, op: CompareOp, value: CondValue) -> Self {
        self.target = CondTarget::Having;
        self.having_path.clear();
        self.add_leaf(LinkOp::And, field, op, value);
        self
    }

    /// Adds an `AND`-linked sibling to the currently open group on whichever
    /// of WHERE/HAVING was opened last.
    pub fn and(mut self, field: &str, op: CompareOp, value: CondValue) -> Self {
        self.add_leaf(LinkOp::And, field, op, value);
        self
    }

    /// Adds an `OR`-linked sibling.
    pub fn or(mut self, field: &str, op: CompareOp, value: CondValue) -> Self {
        self.add_leaf(LinkOp::Or, field, op, value);
        self
    }

    /// Adds an `XOR`-linked sibling.
    pub fn xor(mut self, field: &str, op: CompareOp, value: CondValue) -> Self {
        self.add_leaf(LinkOp::Xor, field, op, value);
        self
    }

    /// Opens a nested `(...)` group under the current condition target,
    /// linked to its previous sibling by `link`. Must be paired with
    /// [`Self::end_group`].
    pub fn where_group(mut self, link: LinkOp) -> Self {
        let path = self.current_path_mut().clone();
        let new_index = {
            let root = self.current_root_mut();
            let group = navigate_mut(root, &path);
            group.add_group(link);
            match group {
                Cond::Group { children, .. } => children.len() - 1,
                Cond::Leaf { .. } => 0,
            }
        };
        self.current_path_mut().push(new_index);
        self
    }

    /// Closes the most recently opened group.
    pub fn end_group(mut self) -> Self {
        self.current_path_mut().pop();
        self
    }

    fn add_leaf(&mut self, link: LinkOp, field: &str, op: CompareOp, value: CondValue) {
        let path = self.current_path_mut().clone();
        let root = self.current_root_mut();
        let group = navigate_mut(root, &path);
        group.add_leaf(link, field, op, value);
    }

    fn current_root_mut(&mut self) -> &mut Cond {
        match self.target {
            CondTarget::Where => &mut self.query.where_cond,
            CondTarget::Having => &mut self.query.having_cond,
        }
    }

    fn current_path_mut(&mut self) -> &mut Vec<usize> {
        match self.target {
            CondTarget::Where => &mut self.where_path,
            CondTarget::Having => &mut self.having_path,
        }
    }

    // ---- grouping / ordering / paging -----------------------------------

    /// `GROUP BY field`.
    pub fn group_by(mut self, field: &str) -> Self {
        self.query.group_by.push(field.to_string());
        self
    }

    /// `ORDER BY field mode`.
    pub fn order_by(mut self, field: &str, mode: SortMode) -> Self {
        self.query.order_by.push(Ordering {
            field: field.to_string(),
            mode,
        });
        self
    }

    /// `ORDER BY field ASC`.
    pub fn asc(self, field: &str) -> Self {
        self.order_by(field, SortMode::Asc)
    }

    /// `ORDER BY field DESC`.
    pub fn desc(self, field: &str) -> Self {
        self.order_by(field, SortMode::Desc)
    }

    /// `LIMIT n [OFFSET offset]`.
    pub fn limit(mut self, n: u64, offset: Option<u64>) -> Self {
        self.query.limit = Some(n);
        if let Some(offset) = offset {
            self.query.offset = Some(offset);
        }
        self
    }

    /// `OFFSET n`.
    pub fn offset(mut self, n: u64) -> Self {
        self.query.offset = Some(n);
        self
    }

    // ---- terminal operations ---------------------------------------------

    /// Consumes the builder, returning the `Query` it built without running
    /// it — used to build the right-hand side of a nested join.
    pub fn build(self) -> Query {
        self.query
    }

    /// Renders the canonical SQL-like text for this query (spec §4.4
    /// `test()`), without running it.
    pub fn test(&self) -> String {
        self.query.to_string()
    }

    /// Compiles and runs the query against `source`, returning a [`Results`]
    /// handle.
    pub fn execute<'s>(self, source: &'s dyn Source) -> Results<'s> {
        Results::new(self.query, source)
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        QueryBuilder::new()
    }
}

fn navigate_mut<'q>(root: &'q mut Cond, path: &[usize]) -> &'q mut Cond {
    let mut node = root;
    for &index in path {
        node = match node {
            Cond::Group { children, .. } => match children.get_mut(index) {
                Some(child) => child,
                None => node,
            },
            Cond::Leaf { .. } => node,
        };
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowql_core::Value;

    #[test]
    fn select_as_binds_to_latest_projection_only() {
        let q = QueryBuilder::new()
            .select("name")
            .unwrap()
            .r#as("n")
            .unwrap()
            .sum("price")
            .unwrap()
            .r#as("total")
            .unwrap()
            .build();
        assert_eq!(q.selections[0].final_name, "n");
        assert_eq!(q.selections[1].final_name, "total");
    }

    #[test]
    fn duplicate_alias_is_an_alias_error() {
        let built = QueryBuilder::new()
            .select("name, price")
            .unwrap()
            .r#as("dup") // aliases `price`, the latest selection
            .unwrap();
        // re-select `category` and try to alias it to the same name
        let err = built.select("category").unwrap().r#as("dup");
        assert!(matches!(err, Err(Error::Alias(_))));
    }

    #[test]
    fn realiasing_the_same_projection_is_rejected() {
        let err = QueryBuilder::new().select("name").unwrap().r#as("n").unwrap().r#as("m");
        assert!(matches!(err, Err(Error::Alias(_))));
    }

    #[test]
    fn as_without_a_prior_selection_errors() {
        let err = QueryBuilder::new().r#as("x");
        assert!(matches!(err, Err(Error::Alias(_))));
    }

    #[test]
    fn on_without_a_join_is_a_join_error() {
        let err = QueryBuilder::new().on("id", CompareOp::Eq, "user_id");
        assert!(matches!(err, Err(Error::Join(_))));
    }

    #[test]
    fn join_then_on_builds_a_join_clause() {
        let q = QueryBuilder::new()
            .from("users")
            .inner_join("orders", "o")
            .on("id", CompareOp::Eq, "user_id")
            .unwrap()
            .build();
        assert_eq!(q.joins.len(), 1);
        assert_eq!(q.joins[0].left_key, "id");
        assert_eq!(q.joins[0].right_key, "user_id");
    }

    #[test]
    fn nested_where_group_rendering() {
        let q = QueryBuilder::new()
            .from("items")
            .r#where("active", CompareOp::Eq, CondValue::Scalar(Value::Bool(true)))
            .where_group(LinkOp::And)
            .and("a", CompareOp::Eq, CondValue::Scalar(Value::Int(1)))
            .or("b", CompareOp::Eq, CondValue::Scalar(Value::Int(2)))
            .end_group()
            .build();
        let rendered = q.to_string();
        assert!(rendered.contains("WHERE active = true AND (a = 1 OR b = 2)"));
    }

    #[test]
    fn order_by_then_asc_desc_sugar() {
        let q = QueryBuilder::new().from("items").asc("name").desc("price").build();
        assert_eq!(q.order_by.len(), 2);
    }
}
