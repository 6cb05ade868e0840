//! An in-memory [`Source`], standing in for the CSV/XML/JSON/YAML/config
//! format adapters the engine is deliberately agnostic to (spec §1
//! non-goals, §6). Useful for tests, doctests, and embedding rowql over
//! data a caller has already parsed into [`Row`]s.

use indexmap::IndexMap;

use rowql_core::{Error, Row};
use rowql_engine::Source;

/// A fixed set of rows held in memory, optionally split into named tables
/// so a query can `FROM` the root set or join against a named one (spec §3
/// "Join spec" reads the right side via the same selector-resolution path
/// as `FROM`).
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    root: Vec<Row>,
    tables: IndexMap<String, Vec<Row>>,
}

impl MemorySource {
    /// A source whose root selector (`None` or `"*"`) yields `rows`.
    pub fn new(rows: Vec<Row>) -> MemorySource {
        MemorySource {
            root: rows,
            tables: IndexMap::new(),
        }
    }

    /// Registers `rows` under `name`, reachable from `FROM name` or a join's
    /// `right` selector.
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> MemorySource {
        self.tables.insert(name.into(), rows);
        self
    }
}

impl Source for MemorySource {
    fn stream_rows(&self, selector: Option<&str>) -> Result<Box<dyn Iterator<Item = Row> + '_>, Error> {
        match selector {
            None | Some("*") | Some("") => Ok(Box::new(self.root.iter().cloned())),
            Some(name) => match self.tables.get(name) {
                Some(rows) => Ok(Box::new(rows.iter().cloned())),
                None => Err(Error::FileNotFound(format!("no in-memory table named '{}'", name))),
            },
        }
    }

    fn source_label(&self) -> String {
        "[memory]".to_string()
    }
}
