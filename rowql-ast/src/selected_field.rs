use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rowql_core::Value;

/// One argument to a scalar/aggregate function call in a projection. Spec
/// §4.3.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FnArg {
    /// A field path, resolved against the row (or, for aggregates, read
    /// from the already-projected finalName).
    Field(String),
    /// A literal scalar argument, e.g. the separator in
    /// `GROUP_CONCAT(name, '; ')` or the precision in `ROUND(price, 2)`.
    Literal(Value),
    /// `*`, only meaningful as the sole argument to `COUNT`.
    Star,
}

impl fmt::Display for FnArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FnArg::Field(s) => f.write_str(s),
            FnArg::Literal(Value::Str(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            FnArg::Literal(v) => write!(f, "{}", v),
            FnArg::Star => f.write_str("*"),
        }
    }
}

/// A scalar or aggregate function call, e.g. `SUM(price)` or
/// `GROUP_CONCAT(name, ',')`. Spec §4.3.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionCall {
    /// The uppercase canonical function name, e.g. `"SUM"`, `"CONCAT"`.
    pub name: String,
    /// The call's arguments, in order.
    pub args: Vec<FnArg>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// One projected field. Spec §3: `{ finalName, originField, isAlias,
/// function? }`, keyed by `finalName` (the alias if present, else the raw
/// expression). Invariant: `finalName` is unique within a query (enforced
/// by the builder/parser, not by this type).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectedField {
    /// The name this field is keyed by in the projected row: the alias if
    /// one was attached, otherwise `origin_field` (or the function's
    /// rendered form, for unaliased function calls).
    pub final_name: String,
    /// The raw source expression: a field path, `*`, or a function's
    /// canonical text.
    pub origin_field: String,
    /// Whether `final_name` came from an explicit `AS alias`.
    pub is_alias: bool,
    /// Set when this projection is a function call rather than a bare
    /// field reference.
    pub function: Option<FunctionCall>,
}

impl SelectedField {
    /// A plain field projection with no alias and no function, e.g. `name`
    /// in `SELECT name`.
    pub fn field(path: impl Into<String>) -> SelectedField {
        let path = path.into();
        SelectedField {
            final_name: path.clone(),
            origin_field: path,
            is_alias: false,
            function: None,
        }
    }

    /// `SELECT *`.
    pub fn star() -> SelectedField {
        SelectedField {
            final_name: "*".to_string(),
            origin_field: "*".to_string(),
            is_alias: false,
            function: None,
        }
    }

    /// A function-call projection, e.g. `UPPER(name)`.
    pub fn function(call: FunctionCall) -> SelectedField {
        let rendered = call.to_string();
        SelectedField {
            final_name: rendered.clone(),
            origin_field: rendered,
            is_alias: false,
            function: Some(call),
        }
    }

    /// Attaches an alias, per spec §3 "an alias may only be attached to the
    /// most recently added projection, exactly once" — enforced by the
    /// builder, not here.
    pub fn with_alias(mut self, alias: impl Into<String>) -> SelectedField {
        self.final_name = alias.into();
        self.is_alias = true;
        self
    }
}

impl fmt::Display for SelectedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin_field)?;
        if self.is_alias {
            write!(f, " AS {}", self.final_name)?;
        }
        Ok(())
    }
}
