use crate::{Error, Row};

/// Whether a missing segment or type mismatch during path resolution is an
/// error or silently becomes `null`. Spec §4.1: WHERE runs in [`Lenient`]
/// mode, HAVING and explicit projections run in [`Strict`] mode.
///
/// [`Lenient`]: PathMode::Lenient
/// [`Strict`]: PathMode::Strict
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PathMode {
    /// Missing segments and type mismatches raise [`Error::MissingField`] /
    /// [`Error::Type`].
    Strict,
    /// Missing segments and type mismatches resolve to `null`.
    Lenient,
}

enum Step {
    Key(String),
    Index(usize),
    /// `[]->key`: the current row must be a sequence; extract `key` from
    /// each element, producing a sequence.
    MapKey(String),
}

/// Resolves a dotted/indexed path over a row. Spec §4.1 grammar:
/// `segment ('.' segment)*` plus `...[]->key` and `...N->key`.
///
/// ```
/// use rowql_core::{resolve_path, PathMode, Row, Value};
/// use indexmap::IndexMap;
///
/// let mut e0 = IndexMap::new();
/// e0.insert("z".to_string(), Row::Scalar(Value::Int(3)));
/// let mut e1 = IndexMap::new();
/// e1.insert("z".to_string(), Row::Scalar(Value::Int(4)));
/// let mut a = IndexMap::new();
/// a.insert("e".to_string(), Row::Seq(vec![Row::Map(e0), Row::Map(e1)]));
/// let mut root = IndexMap::new();
/// root.insert("a".to_string(), Row::Map(a));
/// let row = Row::Map(root);
///
/// let zs = resolve_path(&row, "a.e[]->z", PathMode::Strict).unwrap();
/// assert_eq!(zs, Row::Seq(vec![Row::Scalar(Value::Int(3)), Row::Scalar(Value::Int(4))]));
/// ```
pub fn resolve_path(row: &Row, path: &str, mode: PathMode) -> Result<Row, Error> {
    let steps = parse_path(path);
    let mut current = row.clone();
    for step in &steps {
        current = apply_step(&current, step, mode, path)?;
    }
    Ok(current)
}

fn parse_path(path: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    for segment in path.split('.') {
        if let Some(pos) = segment.find("->") {
            let head = &segment[..pos];
            let key = &segment[pos + 2..];
            if let Some(base) = head.strip_suffix("[]") {
                if !base.is_empty() {
                    steps.push(parse_base(base));
                }
                steps.push(Step::MapKey(key.to_string()));
            } else {
                steps.push(parse_base(head));
                steps.push(Step::Key(key.to_string()));
            }
        } else {
            steps.push(parse_base(segment));
        }
    }
    steps
}

fn parse_base(segment: &str) -> Step {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        Step::Index(segment.parse().expect("validated all-digit segment"))
    } else {
        Step::Key(segment.to_string())
    }
}

fn apply_step(row: &Row, step: &Step, mode: PathMode, path: &str) -> Result<Row, Error> {
    match step {
        Step::Key(key) => match row {
            Row::Map(map) => match map.get(key) {
                Some(v) => Ok(v.clone()),
                None => missing_or_null(mode, path, key),
            },
            _ => type_error_or_null(mode, path, "expected a mapping"),
        },
        Step::Index(index) => match row {
            Row::Seq(seq) => match seq.get(*index) {
                Some(v) => Ok(v.clone()),
                None => missing_or_null(mode, path, &index.to_string()),
            },
            _ => type_error_or_null(mode, path, "expected a sequence"),
        },
        Step::MapKey(key) => match row {
            Row::Seq(seq) => {
                let mut out = Vec::with_capacity(seq.len());
                for elem in seq {
                    out.push(apply_step(elem, &Step::Key(key.clone()), mode, path)?);
                }
                Ok(Row::Seq(out))
            }
            _ => type_error_or_null(mode, path, "expected a sequence for []->"),
        },
    }
}

fn missing_or_null(mode: PathMode, path: &str, segment: &str) -> Result<Row, Error> {
    match mode {
        PathMode::Strict => Err(Error::MissingField(format!(
            "{} (path: {})",
            segment, path
        ))),
        PathMode::Lenient => Ok(Row::null()),
    }
}

fn type_error_or_null(mode: PathMode, path: &str, message: &str) -> Result<Row, Error> {
    match mode {
        PathMode::Strict => Err(Error::Type(format!("{} (path: {})", message, path))),
        PathMode::Lenient => Ok(Row::null()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use indexmap::IndexMap;

    fn sample_row() -> Row {
        let mut e0 = IndexMap::new();
        e0.insert("z".to_string(), Row::Scalar(Value::Int(3)));
        let mut e1 = IndexMap::new();
        e1.insert("z".to_string(), Row::Scalar(Value::Int(4)));
        let mut e2 = IndexMap::new();
        e2.insert("z".to_string(), Row::Scalar(Value::Int(5)));
        let mut a = IndexMap::new();
        a.insert(
            "e".to_string(),
            Row::Seq(vec![Row::Map(e0), Row::Map(e1), Row::Map(e2)]),
        );
        let mut root = IndexMap::new();
        root.insert("a".to_string(), Row::Map(a));
        Row::Map(root)
    }

    #[test]
    fn dotted_path() {
        let row = sample_row();
        let got = resolve_path(&row, "a.e.0.z", PathMode::Strict).unwrap();
        assert_eq!(got, Row::Scalar(Value::Int(3)));
    }

    #[test]
    fn index_then_arrow_key() {
        let row = sample_row();
        let got = resolve_path(&row, "a.e.0->z", PathMode::Strict).unwrap();
        assert_eq!(got, Row::Scalar(Value::Int(3)));
    }

    #[test]
    fn map_over_sequence() {
        let row = sample_row();
        let got = resolve_path(&row, "a.e[]->z", PathMode::Strict).unwrap();
        assert_eq!(
            got,
            Row::Seq(vec![
                Row::Scalar(Value::Int(3)),
                Row::Scalar(Value::Int(4)),
                Row::Scalar(Value::Int(5)),
            ])
        );
    }

    #[test]
    fn missing_segment_strict_errors() {
        let row = sample_row();
        let err = resolve_path(&row, "a.missing", PathMode::Strict).unwrap_err();
        assert!(matches!(err, Error::MissingField(_)));
    }

    #[test]
    fn missing_segment_lenient_is_null() {
        let row = sample_row();
        let got = resolve_path(&row, "a.missing", PathMode::Lenient).unwrap();
        assert_eq!(got, Row::null());
    }

    #[test]
    fn subscript_on_non_collection_strict_errors() {
        let row = sample_row();
        let err = resolve_path(&row, "a.e.0.z.0", PathMode::Strict).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }
}
