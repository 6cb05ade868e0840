use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rowql_core::SortMode;

/// One `ORDER BY` entry. Spec §3 "Ordering": later entries in a `Query`'s
/// order-by list act as secondary sort keys.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ordering {
    /// The field (or projected alias) to sort by.
    pub field: String,
    /// The sort mode.
    pub mode: SortMode,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.mode)
    }
}
