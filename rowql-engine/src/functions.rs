//! Scalar and aggregate function registry. Spec §4.3: every function is a
//! row-function, a constant-function, or an aggregate; this module holds the
//! pure computation for all three shapes. Resolving a call's `FnArg`s against
//! a row (or a group's per-row field values) is [`crate::pipeline`]'s job —
//! everything here just takes already-resolved [`Row`]s.

use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rowql_core::{Error, Row, Value};
use sha1::Digest;

fn one(args: &[Row]) -> Result<&Row, Error> {
    args.first()
        .ok_or_else(|| Error::Type("function call is missing its required argument".to_string()))
}

fn as_scalar(row: &Row) -> Result<&Value, Error> {
    row.as_scalar()
        .ok_or_else(|| Error::Type("expected a scalar value, found a map or sequence".to_string()))
}

fn as_str(row: &Row) -> Result<String, Error> {
    Ok(as_scalar(row)?.coerce_string())
}

fn as_f64(row: &Row) -> Result<f64, Error> {
    as_scalar(row)?
        .as_f64()
        .ok_or_else(|| Error::Type(format!("expected a numeric value, found {}", row)))
}

fn as_i64(row: &Row) -> Result<i64, Error> {
    match as_scalar(row)? {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        other => Err(Error::Type(format!("expected an integer value, found {}", other))),
    }
}

fn is_null(row: &Row) -> bool {
    matches!(row.as_scalar(), Some(Value::Null))
}

/// Dispatches a row-function or constant-function call by its canonical
/// (uppercase) name. `args` are the already-resolved argument rows, in
/// declaration order.
pub fn call_scalar(name: &str, args: &[Row]) -> Result<Row, Error> {
    match name {
        "CONCAT" => concat(args),
        "CONCAT_WS" => concat_ws(args),
        "LOWER" => lower(args),
        "UPPER" => upper(args),
        "LENGTH" => length(args),
        "REVERSE" => reverse(args),
        "BASE64_ENCODE" => base64_encode(args),
        "BASE64_DECODE" => base64_decode(args),
        "CEIL" => ceil(args),
        "FLOOR" => floor(args),
        "ROUND" => round(args),
        "MOD" => modulo(args),
        "MD5" => md5_hash(args),
        "SHA1" => sha1_hash(args),
        "COALESCE" => coalesce(args),
        "COALESCE_NE" => coalesce_ne(args),
        "RANDOM_BYTES" => random_bytes(args),
        "RANDOM_STRING" => random_string(args),
        "EXPLODE" => explode(args),
        "IMPLODE" => implode(args),
        other => Err(Error::Unexpected(format!("unknown function '{}'", other))),
    }
}

/// True for the names [`call_scalar`] knows, used by the parser/builder to
/// reject unknown function calls before execution.
pub fn is_known_scalar(name: &str) -> bool {
    matches!(
        name,
        "CONCAT" | "CONCAT_WS" | "LOWER" | "UPPER" | "LENGTH" | "REVERSE" | "BASE64_ENCODE"
            | "BASE64_DECODE" | "CEIL" | "FLOOR" | "ROUND" | "MOD" | "MD5" | "SHA1" | "COALESCE"
            | "COALESCE_NE" | "RANDOM_BYTES" | "RANDOM_STRING" | "EXPLODE" | "IMPLODE"
    )
}

/// True for the names [`call_aggregate`] knows.
pub fn is_known_aggregate(name: &str) -> bool {
    matches!(name, "COUNT" | "SUM" | "AVG" | "MIN" | "MAX" | "GROUP_CONCAT")
}

fn concat(args: &[Row]) -> Result<Row, Error> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&as_str(arg)?);
    }
    Ok(Row::Scalar(Value::Str(out)))
}

fn concat_ws(args: &[Row]) -> Result<Row, Error> {
    let (sep, rest) = args
        .split_first()
        .ok_or_else(|| Error::Type("CONCAT_WS requires a separator argument".to_string()))?;
    let sep = as_str(sep)?;
    let parts = rest.iter().map(as_str).collect::<Result<Vec<_>, _>>()?;
    Ok(Row::Scalar(Value::Str(parts.join(&sep))))
}

fn lower(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Str(as_str(one(args)?)?.to_lowercase())))
}

fn upper(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Str(as_str(one(args)?)?.to_uppercase())))
}

fn length(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Int(
        as_str(one(args)?)?.chars().count() as i64
    )))
}

fn reverse(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Str(
        as_str(one(args)?)?.chars().rev().collect(),
    )))
}

fn base64_encode(args: &[Row]) -> Result<Row, Error> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(as_str(one(args)?)?);
    Ok(Row::Scalar(Value::Str(encoded)))
}

fn base64_decode(args: &[Row]) -> Result<Row, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(as_str(one(args)?)?)
        .map_err(|err| Error::Type(format!("invalid base64 input: {}", err)))?;
    Ok(Row::Scalar(Value::Str(String::from_utf8_lossy(&bytes).into_owned())))
}

fn ceil(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Int(as_f64(one(args)?)?.ceil() as i64)))
}

fn floor(args: &[Row]) -> Result<Row, Error> {
    Ok(Row::Scalar(Value::Int(as_f64(one(args)?)?.floor() as i64)))
}

fn round(args: &[Row]) -> Result<Row, Error> {
    let value = as_f64(one(args)?)?;
    let places = args.get(1).map(as_i64).transpose()?.unwrap_or(0);
    let factor = 10f64.powi(places as i32);
    Ok(Row::Scalar(Value::Float((value * factor).round() / factor)))
}

fn modulo(args: &[Row]) -> Result<Row, Error> {
    let dividend = as_i64(args.first().ok_or_else(|| Error::Type("MOD requires two arguments".to_string()))?)?;
    let divisor = as_i64(args.get(1).ok_or_else(|| Error::Type("MOD requires two arguments".to_string()))?)?;
    if divisor == 0 {
        return Err(Error::Type("MOD by zero".to_string()));
    }
    Ok(Row::Scalar(Value::Int(dividend % divisor)))
}

fn md5_hash(args: &[Row]) -> Result<Row, Error> {
    let digest = md5::compute(as_str(one(args)?)?);
    Ok(Row::Scalar(Value::Str(format!("{:x}", digest))))
}

fn sha1_hash(args: &[Row]) -> Result<Row, Error> {
    let mut hasher = sha1::Sha1::new();
    hasher.update(as_str(one(args)?)?.as_bytes());
    Ok(Row::Scalar(Value::Str(format!("{:x}", hasher.finalize()))))
}

fn coalesce(args: &[Row]) -> Result<Row, Error> {
    Ok(args.iter().find(|a| !is_null(a)).cloned().unwrap_or_else(Row::null))
}

fn coalesce_ne(args: &[Row]) -> Result<Row, Error> {
    Ok(args
        .iter()
        .find(|a| !is_null(a) && as_str(a).map(|s| !s.is_empty()).unwrap_or(false))
        .cloned()
        .unwrap_or_else(Row::null))
}

fn random_bytes(args: &[Row]) -> Result<Row, Error> {
    let n = args.first().map(as_i64).transpose()?.unwrap_or(16).max(0) as usize;
    let mut rng = rand::rngs::SmallRng::from_entropy();
    let mut buf = vec![0u8; n];
    rng.fill(&mut buf[..]);
    let hex: String = buf.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(Row::Scalar(Value::Str(hex)))
}

fn random_string(args: &[Row]) -> Result<Row, Error> {
    let n = args.first().map(as_i64).transpose()?.unwrap_or(16).max(0) as usize;
    let mut rng = rand::rngs::SmallRng::from_entropy();
    let s: String = (&mut rng).sample_iter(&Alphanumeric).take(n).map(char::from).collect();
    Ok(Row::Scalar(Value::Str(s)))
}

/// Splits a delimited string field into a sequence. The inverse of
/// [`implode`]; paired so `EXPLODE`/`IMPLODE` round-trip on the same
/// separator.
fn explode(args: &[Row]) -> Result<Row, Error> {
    let source = as_str(one(args)?)?;
    let sep = args.get(1).map(as_str).transpose()?.unwrap_or_else(|| ",".to_string());
    let parts = source
        .split(sep.as_str())
        .map(|p| Row::Scalar(Value::Str(p.to_string())))
        .collect();
    Ok(Row::Seq(parts))
}

/// Joins a sequence field into a single delimited string. A scalar argument
/// passes through unchanged, so `IMPLODE` is safe to apply to a field that
/// may or may not already have been exploded.
fn implode(args: &[Row]) -> Result<Row, Error> {
    let field = one(args)?;
    let sep = args.get(1).map(as_str).transpose()?.unwrap_or_else(|| ",".to_string());
    match field {
        Row::Seq(items) => {
            let strs = items.iter().map(as_str).collect::<Result<Vec<_>, _>>()?;
            Ok(Row::Scalar(Value::Str(strs.join(&sep))))
        }
        other => Ok(Row::Scalar(Value::Str(as_str(other)?))),
    }
}

fn numeric_values(rows: &[Row]) -> Result<Vec<Value>, Error> {
    rows.iter()
        .filter_map(|r| r.as_scalar())
        .filter(|v| !matches!(v, Value::Null))
        .map(|v| {
            if v.is_numeric() {
                Ok(v.clone())
            } else {
                Err(Error::Type(format!("non-numeric value in aggregate: {}", v)))
            }
        })
        .collect()
}

/// Dispatches an aggregate call. `values` are the per-row resolved field
/// values across the group (already filtered to the rows that passed
/// WHERE); `extra` are any additional literal arguments (e.g. `GROUP_CONCAT`'s
/// separator, `AVG`'s decimal places). `group_len`/`is_star` only matter to
/// `COUNT(*)`.
pub fn call_aggregate(
    name: &str,
    values: &[Row],
    extra: &[Row],
    group_len: usize,
    is_star: bool,
) -> Result<Value, Error> {
    match name {
        "COUNT" => count(values, extra, group_len, is_star),
        "SUM" => sum(values),
        "AVG" => avg(values, extra),
        "MIN" => extreme(values, std::cmp::Ordering::Less),
        "MAX" => extreme(values, std::cmp::Ordering::Greater),
        "GROUP_CONCAT" => group_concat(values, extra),
        other => Err(Error::Unexpected(format!("unknown aggregate function '{}'", other))),
    }
}

fn count(values: &[Row], _extra: &[Row], group_len: usize, is_star: bool) -> Result<Value, Error> {
    if is_star {
        return Ok(Value::Int(group_len as i64));
    }
    let non_null = values.iter().filter(|r| !is_null(r)).count();
    Ok(Value::Int(non_null as i64))
}

fn sum(values: &[Row]) -> Result<Value, Error> {
    let nums = numeric_values(values)?;
    if nums.is_empty() {
        return Ok(Value::Int(0));
    }
    if nums.iter().all(|v| matches!(v, Value::Int(_))) {
        let total: i64 = nums
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                _ => unreachable!("filtered to Int above"),
            })
            .sum();
        Ok(Value::Int(total))
    } else {
        let total: f64 = nums.iter().map(|v| v.as_f64().expect("numeric_values filtered")).sum();
        Ok(Value::Float(total))
    }
}

fn avg(values: &[Row], extra: &[Row]) -> Result<Value, Error> {
    let nums = numeric_values(values)?;
    if nums.is_empty() {
        return Ok(Value::Null);
    }
    let total: f64 = nums.iter().map(|v| v.as_f64().expect("numeric_values filtered")).sum();
    let mean = total / nums.len() as f64;
    let places = extra.first().map(as_i64).transpose()?.unwrap_or(2);
    let factor = 10f64.powi(places as i32);
    Ok(Value::Float((mean * factor).round() / factor))
}

fn extreme(values: &[Row], want: std::cmp::Ordering) -> Result<Value, Error> {
    let candidates: Vec<&Value> = values
        .iter()
        .filter_map(|r| r.as_scalar())
        .filter(|v| !matches!(v, Value::Null))
        .collect();
    let best = candidates.into_iter().fold(None, |acc, v| match acc {
        None => Some(v),
        Some(current) => {
            if rowql_core::compare_values(v, current) == want {
                Some(v)
            } else {
                Some(current)
            }
        }
    });
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn group_concat(values: &[Row], extra: &[Row]) -> Result<Value, Error> {
    let sep = extra.first().map(as_str).transpose()?.unwrap_or_else(|| ",".to_string());
    let parts: Vec<String> = values
        .iter()
        .filter_map(|r| r.as_scalar())
        .filter(|v| !matches!(v, Value::Null))
        .map(|v| v.coerce_string())
        .collect();
    Ok(Value::Str(parts.join(&sep)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Row {
        Row::Scalar(Value::Str(text.to_string()))
    }

    fn i(n: i64) -> Row {
        Row::Scalar(Value::Int(n))
    }

    #[test]
    fn concat_joins_scalar_args() {
        let out = call_scalar("CONCAT", &[s("foo"), s("bar")]).unwrap();
        assert_eq!(out, Row::Scalar(Value::Str("foobar".to_string())));
    }

    #[test]
    fn concat_ws_uses_first_arg_as_separator() {
        let out = call_scalar("CONCAT_WS", &[s("-"), s("a"), s("b"), s("c")]).unwrap();
        assert_eq!(out, Row::Scalar(Value::Str("a-b-c".to_string())));
    }

    #[test]
    fn upper_and_lower_roundtrip() {
        assert_eq!(call_scalar("UPPER", &[s("MiXeD")]).unwrap(), s("MIXED"));
        assert_eq!(call_scalar("LOWER", &[s("MiXeD")]).unwrap(), s("mixed"));
    }

    #[test]
    fn md5_matches_known_digest() {
        let out = call_scalar("MD5", &[s("")]).unwrap();
        assert_eq!(out, s("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn explode_then_implode_roundtrips() {
        let exploded = call_scalar("EXPLODE", &[s("a,b,c")]).unwrap();
        assert_eq!(
            exploded,
            Row::Seq(vec![s("a"), s("b"), s("c")])
        );
        let imploded = call_scalar("IMPLODE", &[exploded]).unwrap();
        assert_eq!(imploded, s("a,b,c"));
    }

    #[test]
    fn coalesce_skips_nulls() {
        let out = call_scalar("COALESCE", &[Row::null(), Row::null(), s("fallback")]).unwrap();
        assert_eq!(out, s("fallback"));
    }

    #[test]
    fn coalesce_ne_skips_empty_strings_too() {
        let out = call_scalar("COALESCE_NE", &[Row::null(), s(""), s("value")]).unwrap();
        assert_eq!(out, s("value"));
    }

    #[test]
    fn mod_rejects_zero_divisor() {
        let err = call_scalar("MOD", &[i(10), i(0)]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn count_star_counts_all_group_rows_including_null() {
        let got = call_aggregate("COUNT", &[], &[], 4, true).unwrap();
        assert_eq!(got, Value::Int(4));
    }

    #[test]
    fn count_field_skips_nulls() {
        let values = vec![i(1), Row::null(), i(3)];
        let got = call_aggregate("COUNT", &values, &[], values.len(), false).unwrap();
        assert_eq!(got, Value::Int(2));
    }

    #[test]
    fn sum_promotes_to_float_when_any_value_is_float() {
        let values = vec![i(1), Row::Scalar(Value::Float(1.5))];
        let got = call_aggregate("SUM", &values, &[], 2, false).unwrap();
        assert_eq!(got, Value::Float(2.5));
    }

    #[test]
    fn avg_defaults_to_two_decimal_places() {
        let values = vec![i(1), i(2)];
        let got = call_aggregate("AVG", &values, &[], 2, false).unwrap();
        assert_eq!(got, Value::Float(1.5));
    }

    #[test]
    fn min_and_max_ignore_nulls() {
        let values = vec![i(5), Row::null(), i(1), i(9)];
        assert_eq!(call_aggregate("MIN", &values, &[], 4, false).unwrap(), Value::Int(1));
        assert_eq!(call_aggregate("MAX", &values, &[], 4, false).unwrap(), Value::Int(9));
    }

    #[test]
    fn group_concat_uses_configurable_separator() {
        let values = vec![s("a"), s("b"), Row::null(), s("c")];
        let got = call_aggregate("GROUP_CONCAT", &values, &[s("; ")], 4, false).unwrap();
        assert_eq!(got, Value::Str("a; b; c".to_string()));
    }
}
