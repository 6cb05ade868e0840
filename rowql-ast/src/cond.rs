use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rowql_core::{CompareOp, Error, LinkOp, PathMode, Row, Value};

/// The right-hand side of a condition leaf: either a single scalar (`=`,
/// `<`, `LIKE`, `IS`, ...) or a list (`IN`/`NOT IN`). Spec §3 "Condition
/// tree".
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CondValue {
    /// A single scalar operand.
    Scalar(Value),
    /// A list operand, for `IN`/`NOT IN`.
    List(Vec<Value>),
}

impl fmt::Display for CondValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CondValue::Scalar(v) => write!(f, "{}", render_literal(v)),
            CondValue::List(items) => {
                write!(f, "(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", render_literal(v))?;
                }
                write!(f, ")")
            }
        }
    }
}

fn render_literal(v: &Value) -> String {
    match v {
        Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.coerce_string(),
    }
}

/// A recursive condition tree: either a leaf predicate or a group of child
/// trees connected by logical operators. Spec §3/§4.2.
///
/// Every node (leaf or group) carries the [`LinkOp`] that connects it to its
/// *previous sibling* within the parent group; the first child of a group
/// has its own `link` ignored by the evaluator (spec §4.2: "First child's
/// linkOp is ignored").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cond {
    /// A single predicate: `key op value`.
    Leaf {
        /// Connects this leaf to the previous sibling.
        link: LinkOp,
        /// The field path this predicate reads.
        key: String,
        /// The comparison operator.
        op: CompareOp,
        /// The right-hand operand.
        value: CondValue,
    },
    /// A parenthesized group of child trees.
    Group {
        /// Connects this group to the previous sibling.
        link: LinkOp,
        /// Child trees, evaluated left to right.
        children: Vec<Cond>,
    },
}

impl Cond {
    /// An empty root group. Root groups default to AND per spec §3; the
    /// link is irrelevant (nothing links a root to a sibling) but needs a
    /// value to satisfy the type.
    pub fn root() -> Cond {
        Cond::Group {
            link: LinkOp::And,
            children: Vec::new(),
        }
    }

    /// The link that connects this node to its previous sibling.
    pub fn link(&self) -> LinkOp {
        match self {
            Cond::Leaf { link, .. } => *link,
            Cond::Group { link, .. } => *link,
        }
    }

    /// True for a `Group` with no children — evaluates to `true` (spec §3).
    pub fn is_empty_group(&self) -> bool {
        matches!(self, Cond::Group { children, .. } if children.is_empty())
    }

    /// Appends a leaf predicate. Only meaningful when `self` is a `Group`;
    /// called on a `Leaf` this is a builder misuse and does nothing, same
    /// as appending to a tree that can't have children.
    pub fn add_leaf(&mut self, link: LinkOp, key: impl Into<String>, op: CompareOp, value: CondValue) {
        if let Cond::Group { children, .. } = self {
            children.push(Cond::Leaf {
                link,
                key: key.into(),
                op,
                value,
            });
        }
    }

    /// Appends a nested group, returning a mutable reference to it so the
    /// caller can keep appending into the new group (the "cursor" idiom
    /// spec §9 calls for).
    pub fn add_group(&mut self, link: LinkOp) -> &mut Cond {
        if let Cond::Group { children, .. } = self {
            children.push(Cond::Group {
                link,
                children: Vec::new(),
            });
            children.last_mut().expect("just pushed")
        } else {
            // A Leaf has no children; return self so callers that hold a
            // stale cursor still get *something* rather than panicking.
            self
        }
    }

    /// Evaluates this tree against a row. Spec §4.2: folds left to right,
    /// short-circuiting AND/OR once the running outcome can't change;
    /// XOR never short-circuits.
    pub fn evaluate(&self, row: &Row, mode: PathMode) -> Result<bool, Error> {
        match self {
            Cond::Leaf { key, op, value, .. } => evaluate_leaf(row, key, *op, value, mode),
            Cond::Group { children, .. } => evaluate_group(children, row, mode),
        }
    }
}

fn evaluate_group(children: &[Cond], row: &Row, mode: PathMode) -> Result<bool, Error> {
    if children.is_empty() {
        return Ok(true);
    }
    let mut running = children[0].evaluate(row, mode)?;
    for child in &children[1..] {
        let link = child.link();
        if link.short_circuits(running) {
            continue;
        }
        let next = child.evaluate(row, mode)?;
        running = link.fold(running, next);
    }
    Ok(running)
}

fn evaluate_leaf(
    row: &Row,
    key: &str,
    op: CompareOp,
    value: &CondValue,
    mode: PathMode,
) -> Result<bool, Error> {
    let resolved = rowql_core::resolve_path(row, key, mode)?;
    let scalar = match &resolved {
        Row::Scalar(v) => v.clone(),
        Row::Map(_) | Row::Seq(_) => Value::Null,
    };
    match_scalar(op, &scalar, value, key)
}

/// Tests a single already-resolved scalar against a comparison operator and
/// operand. Factored out of [`evaluate_leaf`] so `rowql-engine`'s join stage
/// can reuse the exact same operator semantics when comparing a left-row key
/// against a right-row key instead of against a condition-tree literal.
pub fn match_scalar(op: CompareOp, scalar: &Value, value: &CondValue, key: &str) -> Result<bool, Error> {
    match (op, value) {
        (CompareOp::Eq, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) == std::cmp::Ordering::Equal)
        }
        (CompareOp::NotEq, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) != std::cmp::Ordering::Equal)
        }
        (CompareOp::Lt, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) == std::cmp::Ordering::Less)
        }
        (CompareOp::LtEq, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) != std::cmp::Ordering::Greater)
        }
        (CompareOp::Gt, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) == std::cmp::Ordering::Greater)
        }
        (CompareOp::GtEq, CondValue::Scalar(v)) => {
            Ok(rowql_core::compare_values(&scalar, v) != std::cmp::Ordering::Less)
        }
        (CompareOp::Like, CondValue::Scalar(Value::Str(pattern))) => {
            Ok(crate::like::like_match(&scalar.coerce_string(), pattern))
        }
        (CompareOp::NotLike, CondValue::Scalar(Value::Str(pattern))) => {
            Ok(!crate::like::like_match(&scalar.coerce_string(), pattern))
        }
        (CompareOp::In, CondValue::List(items)) => Ok(items
            .iter()
            .any(|v| rowql_core::compare_values(&scalar, v) == std::cmp::Ordering::Equal)),
        (CompareOp::NotIn, CondValue::List(items)) => Ok(!items
            .iter()
            .any(|v| rowql_core::compare_values(&scalar, v) == std::cmp::Ordering::Equal)),
        (CompareOp::Is, _) => Ok(matches!(scalar, Value::Null)),
        (CompareOp::IsNot, _) => Ok(!matches!(scalar, Value::Null)),
        _ => Err(Error::Type(format!(
            "operator {} is not compatible with the given operand for key {}",
            op, key
        ))),
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::Leaf { key, op, value, .. } => write!(f, "{} {} {}", key, op, value),
            Cond::Group { children, .. } => {
                write!(f, "(")?;
                render_children(f, children)?;
                write!(f, ")")
            }
        }
    }
}

fn render_children<W: fmt::Write>(f: &mut W, children: &[Cond]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", child.link())?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

/// Renders a root condition tree the way `test()` wants it: the children
/// joined by their link operators, without the enclosing parentheses a
/// nested [`Cond::Group`] would otherwise get from its `Display` impl.
pub fn render_root(cond: &Cond) -> String {
    match cond {
        Cond::Group { children, .. } => {
            let mut s = String::new();
            let _ = render_children(&mut s, children);
            s
        }
        leaf => leaf.to_string(),
    }
}
