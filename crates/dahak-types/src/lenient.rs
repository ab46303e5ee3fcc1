//! Deserializers for numeric form fields. The admin client posts raw
//! `<input>` values, so numbers can arrive as JSON numbers or as strings.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn f64_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid number: {:?}", s))),
        other => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

pub fn opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid integer: {:?}", s))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(deserialize_with = "f64_from_any")]
        price: f64,
        #[serde(default, deserialize_with = "opt_i64_from_any")]
        category_id: Option<i64>,
    }

    #[test]
    fn accepts_numbers_and_strings() {
        let f: Form = serde_json::from_str(r#"{"price": 12.5, "category_id": 3}"#).unwrap();
        assert_eq!(f.price, 12.5);
        assert_eq!(f.category_id, Some(3));

        let f: Form = serde_json::from_str(r#"{"price": " 4500 ", "category_id": "7"}"#).unwrap();
        assert_eq!(f.price, 4500.0);
        assert_eq!(f.category_id, Some(7));
    }

    #[test]
    fn blank_and_missing_ids_are_none() {
        let f: Form = serde_json::from_str(r#"{"price": 1, "category_id": ""}"#).unwrap();
        assert_eq!(f.category_id, None);
        let f: Form = serde_json::from_str(r#"{"price": 1}"#).unwrap();
        assert_eq!(f.category_id, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Form>(r#"{"price": "cheap"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"price": true}"#).is_err());
    }
}
