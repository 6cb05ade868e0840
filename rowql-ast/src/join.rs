use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rowql_core::{CompareOp, JoinKind};

use crate::Query;

/// The right side of a join: either a raw selector resolved against the
/// same `Source` the left side came from, or a fully built nested
/// [`Query`]. Spec §3 "Join spec": `right: Query|DataSource`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinSource {
    /// A file-query literal or bare selector, e.g. `(orders.json).data.orders`.
    Selector(String),
    /// A nested query, executed in full before the join build side is
    /// materialized.
    Query(Box<Query>),
}

impl fmt::Display for JoinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSource::Selector(s) => f.write_str(s),
            JoinSource::Query(q) => write!(f, "({})", q),
        }
    }
}

/// A single join clause. Spec §3 "Join spec", §4.6 step 2.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Join {
    /// The right-hand side of the join.
    pub right: JoinSource,
    /// The alias right-side fields are nested under in the merged row, if
    /// any; `None` merges right-side fields flat into the left row.
    pub alias: Option<String>,
    /// The field path read from the left row.
    pub left_key: String,
    /// The field path read from the right row.
    pub right_key: String,
    /// The comparison operator (defaults to `=`).
    pub op: CompareOp,
    /// `INNER` or `LEFT`.
    pub kind: JoinKind,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} JOIN {}", self.kind, self.right)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        write!(f, " ON {} {} {}", self.left_key, self.op, self.right_key)
    }
}
