use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{cond, Cond, Join, Ordering, SelectedField};

/// The full data model of a query, built by a `rowql-parser` `QueryBuilder`
/// or produced by parsing query text. Spec §3 "Query", §4.4.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Query {
    /// Projected fields, in order. Empty means `SELECT *`.
    pub selections: Vec<SelectedField>,
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// The file-query literal or bare selector this query scans.
    pub from: Option<String>,
    /// Join clauses, applied in order.
    pub joins: Vec<Join>,
    /// The `WHERE` condition tree. An empty root group matches every row.
    pub where_cond: Cond,
    /// The `HAVING` condition tree, evaluated after grouping/aggregation.
    pub having_cond: Cond,
    /// `GROUP BY` field paths.
    pub group_by: Vec<String>,
    /// `ORDER BY` entries, applied in listed order as primary/secondary/...
    /// sort keys.
    pub order_by: Vec<Ordering>,
    /// `LIMIT`.
    pub limit: Option<u64>,
    /// `OFFSET`.
    pub offset: Option<u64>,
}

impl Query {
    /// A bare query scanning nothing, selecting everything, filtering
    /// nothing. The starting point a `QueryBuilder` fills in.
    pub fn new() -> Query {
        Query {
            selections: Vec::new(),
            distinct: false,
            from: None,
            joins: Vec::new(),
            where_cond: Cond::root(),
            having_cond: Cond::root(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl Default for Query {
    fn default() -> Query {
        Query::new()
    }
}

impl fmt::Display for Query {
    /// Renders the canonical textual form spec §4.4/§6 call `test()`: one
    /// clause per line, two-space indentation, uppercase keywords.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.selections.is_empty() {
            write!(f, "*")?;
        } else {
            for (i, field) in self.selections.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", field)?;
            }
        }
        writeln!(f)?;

        if let Some(from) = &self.from {
            writeln!(f, "FROM {}", from)?;
        }

        for join in &self.joins {
            writeln!(f, "  {}", join)?;
        }

        if !self.where_cond.is_empty_group() {
            writeln!(f, "WHERE {}", cond::render_root(&self.where_cond))?;
        }

        if !self.group_by.is_empty() {
            writeln!(f, "GROUP BY {}", self.group_by.join(", "))?;
        }

        if !self.having_cond.is_empty_group() {
            writeln!(f, "HAVING {}", cond::render_root(&self.having_cond))?;
        }

        if !self.order_by.is_empty() {
            let rendered: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            writeln!(f, "ORDER BY {}", rendered.join(", "))?;
        }

        if let Some(limit) = self.limit {
            writeln!(f, "LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            writeln!(f, "OFFSET {}", offset)?;
        }

        Ok(())
    }
}
