//! End-to-end checks run through the public facade, one per literal
//! scenario: building a query with [`QueryBuilder`], running it against a
//! [`MemorySource`], and checking the exact rows/values produced.

use indexmap::IndexMap;

use rowql::prelude::*;

fn products() -> Vec<Row> {
    vec![
        row(vec![("id", Value::Int(1)), ("name", Value::Str("A".into())), ("price", Value::Int(100))]),
        row(vec![("id", Value::Int(2)), ("name", Value::Str("B".into())), ("price", Value::Int(200))]),
        row(vec![("id", Value::Int(3)), ("name", Value::Str("C".into())), ("price", Value::Int(300))]),
        row(vec![("id", Value::Int(4)), ("name", Value::Str("D".into())), ("price", Value::Int(400))]),
    ]
}

#[test]
fn simple_filter_keeps_source_order() {
    let source = MemorySource::new(products());
    let query = QueryBuilder::new()
        .select_all()
        .unwrap()
        .from("*")
        .r#where("price", CompareOp::Gt, CondValue::Scalar(Value::Int(100)))
        .build();

    let rows = Results::new(query, &source).fetch_all().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].as_map().unwrap().get("name").unwrap().as_scalar().unwrap(),
        &Value::Str("B".to_string())
    );
    assert_eq!(
        rows[0].as_map().unwrap().get("price").unwrap().as_scalar().unwrap(),
        &Value::Int(200)
    );
}

#[test]
fn fetch_single_on_an_unprojected_field_is_missing() {
    let source = MemorySource::new(products());
    let query = QueryBuilder::new()
        .select("name")
        .unwrap()
        .from("*")
        .r#where("price", CompareOp::Eq, CondValue::Scalar(Value::Int(100)))
        .build();

    let results = Results::new(query.clone(), &source);
    assert_eq!(results.fetch_single("name").unwrap(), Row::Scalar(Value::Str("A".to_string())));

    let results = Results::new(query, &source);
    assert!(matches!(results.fetch_single("price"), Err(Error::MissingField(_))));
}

#[test]
fn aggregate_with_having_and_order_by() {
    let rows = vec![
        row(vec![("category", Value::Str("x".into())), ("price", Value::Int(300))]),
        row(vec![("category", Value::Str("x".into())), ("price", Value::Int(300))]),
        row(vec![("category", Value::Str("y".into())), ("price", Value::Int(100))]),
    ];
    let source = MemorySource::new(rows);
    let query = QueryBuilder::new()
        .select("category")
        .unwrap()
        .sum("price")
        .unwrap()
        .r#as("total")
        .unwrap()
        .from("*")
        .group_by("category")
        .having("total", CompareOp::Gt, CondValue::Scalar(Value::Int(500)))
        .desc("total")
        .build();

    let rows = Results::new(query, &source).fetch_all().unwrap();
    assert_eq!(rows.len(), 1);
    let map = rows[0].as_map().unwrap();
    assert_eq!(map.get("category").unwrap().as_scalar().unwrap(), &Value::Str("x".to_string()));
    assert_eq!(map.get("total").unwrap().as_scalar().unwrap(), &Value::Int(600));
}

#[test]
fn inner_join_with_having_and_order_by() {
    let users = vec![
        row(vec![("id", Value::Int(1)), ("name", Value::Str("A".into()))]),
        row(vec![("id", Value::Int(2)), ("name", Value::Str("B".into()))]),
    ];
    let orders = vec![
        row(vec![("id", Value::Int(10)), ("user_id", Value::Int(1)), ("total", Value::Int(150))]),
        row(vec![("id", Value::Int(11)), ("user_id", Value::Int(1)), ("total", Value::Int(250))]),
        row(vec![("id", Value::Int(12)), ("user_id", Value::Int(3)), ("total", Value::Int(300))]),
    ];
    let source = MemorySource::new(users).with_table("orders", orders);

    let query = QueryBuilder::new()
        .select("id")
        .unwrap()
        .select("name")
        .unwrap()
        .select("o.id")
        .unwrap()
        .r#as("orderId")
        .unwrap()
        .select("o.total")
        .unwrap()
        .r#as("totalPrice")
        .unwrap()
        .from("*")
        .inner_join("orders", "o")
        .on("id", CompareOp::Eq, "user_id")
        .unwrap()
        .having("totalPrice", CompareOp::Gt, CondValue::Scalar(Value::Int(200)))
        .desc("totalPrice")
        .build();

    let rows = Results::new(query, &source).fetch_all().unwrap();
    assert_eq!(rows.len(), 1);
    let map = rows[0].as_map().unwrap();
    assert_eq!(map.get("id").unwrap().as_scalar().unwrap(), &Value::Int(1));
    assert_eq!(map.get("name").unwrap().as_scalar().unwrap(), &Value::Str("A".to_string()));
    assert_eq!(map.get("orderId").unwrap().as_scalar().unwrap(), &Value::Int(11));
    assert_eq!(map.get("totalPrice").unwrap().as_scalar().unwrap(), &Value::Int(250));
}

#[test]
fn like_matches_wildcard_pattern_anchored() {
    let rows = vec![
        row(vec![("name", Value::Str("ProdA".into()))]),
        row(vec![("name", Value::Str("ProdXYZA".into()))]),
        row(vec![("name", Value::Str("ProdB".into()))]),
        row(vec![("name", Value::Str("Other".into()))]),
    ];
    let source = MemorySource::new(rows);
    let query = QueryBuilder::new()
        .select("name")
        .unwrap()
        .from("*")
        .r#where("name", CompareOp::Like, CondValue::Scalar(Value::Str("Prod%A".to_string())))
        .build();

    let rows = Results::new(query, &source).fetch_all().unwrap();
    let names: Vec<&str> = rows
        .iter()
        .map(|r| match r.as_map().unwrap().get("name").unwrap().as_scalar().unwrap() {
            Value::Str(s) => s.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(names, vec!["ProdA", "ProdXYZA"]);
}

#[test]
fn path_extraction_maps_a_selector_over_a_sequence() {
    let zs = Row::Seq(vec![
        row(vec![("z", Value::Int(3))]),
        row(vec![("z", Value::Int(4))]),
        row(vec![("z", Value::Int(5))]),
    ]);
    let mut a = IndexMap::new();
    a.insert("e".to_string(), zs);
    let mut top = IndexMap::new();
    top.insert("a".to_string(), Row::Map(a));
    let source = MemorySource::new(vec![Row::Map(top)]);

    let query = QueryBuilder::new()
        .select("a.e[]->z")
        .unwrap()
        .r#as("zs")
        .unwrap()
        .from("*")
        .build();

    let rows = Results::new(query, &source).fetch_all().unwrap();
    assert_eq!(rows.len(), 1);
    let zs = rows[0].as_map().unwrap().get("zs").unwrap();
    let seq = zs.as_seq().unwrap();
    let values: Vec<&Value> = seq.iter().map(|r| r.as_scalar().unwrap()).collect();
    assert_eq!(values, vec![&Value::Int(3), &Value::Int(4), &Value::Int(5)]);
}

#[test]
fn distinct_is_idempotent_on_an_already_distinct_stream() {
    let rows = vec![
        row(vec![("category", Value::Str("x".into()))]),
        row(vec![("category", Value::Str("y".into()))]),
        row(vec![("category", Value::Str("x".into()))]),
    ];
    let source = MemorySource::new(rows);
    let query = QueryBuilder::new().select("category").unwrap().distinct().from("*").build();

    let first = Results::new(query.clone(), &source).fetch_all().unwrap();
    assert_eq!(first.len(), 2);

    // Re-running DISTINCT over the already-distinct result is a no-op.
    let distinct_source = MemorySource::new(first.clone());
    let requery = QueryBuilder::new().select_all().unwrap().distinct().from("*").build();
    let second = Results::new(requery, &distinct_source).fetch_all().unwrap();
    pretty_assertions::assert_eq!(second, first);
}
