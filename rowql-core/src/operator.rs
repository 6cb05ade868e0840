use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Comparison operators usable in `WHERE`/`HAVING`/`ON` and as condition
/// leaves built via the fluent builder. Spec §2 item 1.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `IS`
    Is,
    /// `IS NOT`
    IsNot,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
            CompareOp::Is => "IS",
            CompareOp::IsNot => "IS NOT",
        })
    }
}

/// Logical operators linking condition-tree siblings. Spec §2 item 1, §4.2.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkOp {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
}

impl LinkOp {
    /// Folds `running` with `next` per spec §4.2: AND folds with `&&`, OR
    /// with `||`, XOR with boolean exclusive-or.
    pub fn fold(self, running: bool, next: bool) -> bool {
        match self {
            LinkOp::And => running && next,
            LinkOp::Or => running || next,
            LinkOp::Xor => running ^ next,
        }
    }

    /// True when folding `running` with this operator can no longer change
    /// the outcome of a *pure* AND/OR sequence, letting the evaluator
    /// short-circuit. Never short-circuits for XOR, which always depends on
    /// every operand.
    pub fn short_circuits(self, running: bool) -> bool {
        match self {
            LinkOp::And => !running,
            LinkOp::Or => running,
            LinkOp::Xor => false,
        }
    }
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkOp::And => "AND",
            LinkOp::Or => "OR",
            LinkOp::Xor => "XOR",
        })
    }
}

/// `ORDER BY` sort modes. Spec §2 item 1.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortMode {
    /// Ascending, nulls first.
    Asc,
    /// Descending, nulls last.
    Desc,
    /// Natural string order (digit runs compared numerically).
    NatSort,
    /// Randomized order.
    Shuffle,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Asc => "ASC",
            SortMode::Desc => "DESC",
            SortMode::NatSort => "NATSORT",
            SortMode::Shuffle => "SHUFFLE",
        })
    }
}

/// Join kinds. Spec §2 item 1, §4.6 item 2.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_op_folds_like_boolean_operators() {
        assert!(LinkOp::And.fold(true, true));
        assert!(!LinkOp::And.fold(true, false));
        assert!(LinkOp::Or.fold(false, true));
        assert!(LinkOp::Xor.fold(true, true) == false);
        assert!(LinkOp::Xor.fold(true, false));
    }

    #[test]
    fn short_circuit_rules() {
        assert!(LinkOp::And.short_circuits(false));
        assert!(!LinkOp::And.short_circuits(true));
        assert!(LinkOp::Or.short_circuits(true));
        assert!(!LinkOp::Or.short_circuits(false));
        assert!(!LinkOp::Xor.short_circuits(true));
        assert!(!LinkOp::Xor.short_circuits(false));
    }
}
