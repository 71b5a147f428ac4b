use crate::value::{Float64, KeyTuple, TargetType, Value, ValueKind};
use ulid::Ulid;

#[test]
fn float64_canonicalizes_negative_zero() {
    let neg = Float64::try_new(-0.0).expect("finite");
    let pos = Float64::try_new(0.0).expect("finite");

    assert_eq!(neg, pos);
    assert_eq!(Value::Float64(neg), Value::Float64(pos));
}

#[test]
fn float64_rejects_non_finite() {
    assert!(Float64::try_new(f64::NAN).is_none());
    assert!(Float64::try_new(f64::INFINITY).is_none());
    assert_eq!(Value::float64(f64::NAN), Value::Null);
}

#[test]
fn coerce_passes_matching_kind_through() {
    assert_eq!(Value::Int(7).coerce(ValueKind::Int), Ok(Value::Int(7)));
    assert_eq!(
        Value::from("abc").coerce(ValueKind::Text),
        Ok(Value::Text("abc".into()))
    );
}

#[test]
fn coerce_widens_integers_within_range() {
    assert_eq!(Value::Int(5).coerce(ValueKind::Uint), Ok(Value::Uint(5)));
    assert_eq!(Value::Uint(5).coerce(ValueKind::Int), Ok(Value::Int(5)));
    assert_eq!(
        Value::Int(3).coerce(ValueKind::Float64),
        Ok(Value::float64(3.0))
    );
}

#[test]
fn coerce_rejects_lossy_conversions() {
    assert_eq!(Value::Int(-1).coerce(ValueKind::Uint), Err(Value::Int(-1)));
    assert_eq!(
        Value::Uint(u64::MAX).coerce(ValueKind::Int),
        Err(Value::Uint(u64::MAX))
    );
    assert_eq!(
        Value::Int(i64::MAX).coerce(ValueKind::Float64),
        Err(Value::Int(i64::MAX))
    );
    assert_eq!(Value::Null.coerce(ValueKind::Int), Err(Value::Null));
    assert_eq!(
        Value::Bool(true).coerce(ValueKind::Int),
        Err(Value::Bool(true))
    );
}

#[test]
fn coerce_text_and_ulid() {
    let ulid = Ulid::from_parts(1_700_000_000_000, 42);
    let text = Value::Text(ulid.to_string());

    assert_eq!(text.coerce(ValueKind::Ulid), Ok(Value::Ulid(ulid)));
    assert_eq!(
        Value::Ulid(ulid).coerce(ValueKind::Text),
        Ok(Value::Text(ulid.to_string()))
    );
    assert!(Value::from("not-a-ulid").coerce(ValueKind::Ulid).is_err());
}

#[test]
fn default_value_follows_nullability_and_kind() {
    assert_eq!(TargetType::nullable(ValueKind::Int).default_value(), Value::Null);
    assert_eq!(TargetType::required(ValueKind::Int).default_value(), Value::Int(0));
    assert_eq!(TargetType::required(ValueKind::Uint).default_value(), Value::Uint(0));
    assert_eq!(
        TargetType::required(ValueKind::Bool).default_value(),
        Value::Bool(false)
    );
    assert_eq!(
        TargetType::required(ValueKind::Ulid).default_value(),
        Value::Ulid(Ulid::nil())
    );
    assert_eq!(TargetType::required(ValueKind::Text).default_value(), Value::Null);
    assert_eq!(TargetType::required(ValueKind::Blob).default_value(), Value::Null);
}

#[test]
fn key_tuples_compare_structurally() {
    let left = KeyTuple::new(vec![Value::Int(1), Value::from("a")]);
    let right: KeyTuple = vec![Value::Int(1), Value::from("a")].into_iter().collect();
    let other = KeyTuple::new(vec![Value::Int(1), Value::from("b")]);

    assert_eq!(left, right);
    assert_ne!(left, other);
    assert_eq!(left.to_string(), "(1, 'a')");
}

#[test]
fn value_serde_round_trips_through_json() {
    let value = Value::Ulid(Ulid::from_parts(1, 2));
    let json = serde_json::to_string(&value).expect("serialize");
    let back: Value = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(back, value);
}

#[test]
fn target_type_display_marks_nullable() {
    assert_eq!(TargetType::nullable(ValueKind::Text).to_string(), "text?");
    assert_eq!(TargetType::required(ValueKind::Uint).to_string(), "uint");
}
