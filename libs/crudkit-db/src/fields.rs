//! Per-entity dispatch table from wire field names to columns, plus the
//! JSON → `sea_orm::Value` coercion used for filtering and for patching
//! active models without reflection.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde_json::Value as Json;
use thiserror::Error;

/// Whitelisted field kind; decides which `sea_orm::Value` variant a JSON value becomes.
/// Must match the Rust type of the model attribute (`String`, `i64`, `f64`, `bool`,
/// `DateTimeUtc`, `Date`, `Decimal`, `Json`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    DateTimeUtc,
    Date,
    Decimal,
    Json,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
    pub nullable: bool,
}

#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map.insert(
            api_name.into(),
            Field {
                col,
                kind,
                nullable: false,
            },
        );
        self
    }

    pub fn insert_nullable(
        mut self,
        api_name: impl Into<String>,
        col: E::Column,
        kind: FieldKind,
    ) -> Self {
        self.map.insert(
            api_name.into(),
            Field {
                col,
                kind,
                nullable: true,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(name)
    }

    pub fn require(&self, name: &str) -> FieldResult<&Field<E>> {
        self.get(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("type mismatch on `{field}`: expected {expected:?}, got {got}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        got: &'static str,
    },

    #[error("`{0}` is not nullable")]
    NotNullable(String),

    #[error("lookup `{lookup}` is not supported on `{field}`")]
    UnsupportedLookup { field: String, lookup: &'static str },
}

pub type FieldResult<T> = Result<T, FieldError>;

/* ---------- coercion ---------- */

fn json_type(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Typed SQL NULL for a kind.
pub fn null_of(kind: FieldKind) -> sea_orm::Value {
    use sea_orm::Value as V;
    match kind {
        FieldKind::String => V::String(None),
        FieldKind::I64 => V::BigInt(None),
        FieldKind::F64 => V::Double(None),
        FieldKind::Bool => V::Bool(None),
        FieldKind::DateTimeUtc => V::ChronoDateTimeUtc(None),
        FieldKind::Date => V::ChronoDate(None),
        FieldKind::Decimal => V::Decimal(None),
        FieldKind::Json => V::Json(None),
    }
}

/// Coerce a non-null JSON value into the `sea_orm::Value` variant for `kind`.
pub fn coerce(field: &str, kind: FieldKind, v: &Json) -> FieldResult<sea_orm::Value> {
    use sea_orm::Value as V;

    let mismatch = || FieldError::TypeMismatch {
        field: field.to_string(),
        expected: kind,
        got: json_type(v),
    };

    Ok(match (kind, v) {
        (FieldKind::Json, other) => V::Json(Some(Box::new(other.clone()))),
        (_, Json::Null) => return Err(mismatch()),

        (FieldKind::String, Json::String(s)) => V::String(Some(Box::new(s.clone()))),

        (FieldKind::I64, Json::Number(n)) => V::BigInt(Some(n.as_i64().ok_or_else(mismatch)?)),
        (FieldKind::I64, Json::String(s)) => {
            V::BigInt(Some(s.trim().parse::<i64>().map_err(|_| mismatch())?))
        }

        (FieldKind::F64, Json::Number(n)) => V::Double(Some(n.as_f64().ok_or_else(mismatch)?)),

        (FieldKind::Bool, Json::Bool(b)) => V::Bool(Some(*b)),

        (FieldKind::Decimal, Json::Number(n)) => {
            let d = Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map_err(|_| mismatch())?;
            V::Decimal(Some(Box::new(d)))
        }
        (FieldKind::Decimal, Json::String(s)) => {
            let d = Decimal::from_str(s.trim()).map_err(|_| mismatch())?;
            V::Decimal(Some(Box::new(d)))
        }

        (FieldKind::DateTimeUtc, Json::String(s)) => {
            let dt = DateTime::parse_from_rfc3339(s)
                .map_err(|_| mismatch())?
                .with_timezone(&Utc);
            V::ChronoDateTimeUtc(Some(Box::new(dt)))
        }
        (FieldKind::Date, Json::String(s)) => {
            let d = s.parse::<NaiveDate>().map_err(|_| mismatch())?;
            V::ChronoDate(Some(Box::new(d)))
        }

        _ => return Err(mismatch()),
    })
}

/// Coerce a value that is about to be written into a column; `null` is only
/// accepted for nullable fields.
pub fn coerce_for_write<E: EntityTrait>(
    name: &str,
    field: &Field<E>,
    v: &Json,
) -> FieldResult<sea_orm::Value> {
    if v.is_null() {
        return match (field.kind, field.nullable) {
            (kind, true) => Ok(null_of(kind)),
            (FieldKind::Json, false) => Ok(sea_orm::Value::Json(Some(Box::new(Json::Null)))),
            _ => Err(FieldError::NotNullable(name.to_string())),
        };
    }
    coerce(name, field.kind, v)
}

/// String key for a column value, used to index rows by an attribute.
pub fn encode_value(value: &sea_orm::Value) -> Option<String> {
    use sea_orm::Value as V;
    Some(match value {
        V::String(Some(s)) => s.to_string(),
        V::BigInt(Some(i)) => i.to_string(),
        V::Int(Some(i)) => i.to_string(),
        V::Double(Some(f)) => ryu::Buffer::new().format(*f).to_string(),
        V::Bool(Some(b)) => b.to_string(),
        V::ChronoDateTimeUtc(Some(dt)) => dt.to_rfc3339(),
        V::ChronoDate(Some(d)) => d.to_string(),
        V::Decimal(Some(d)) => d.to_string(),
        V::Uuid(Some(u)) => u.to_string(),
        _ => return None,
    })
}

#[inline]
pub(crate) fn ensure_string_field<E: EntityTrait>(name: &str, f: &Field<E>) -> FieldResult<()> {
    if f.kind != FieldKind::String {
        return Err(FieldError::TypeMismatch {
            field: name.to_string(),
            expected: FieldKind::String,
            got: "non-string field",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_decimal_from_number_and_string() {
        let a = coerce("total", FieldKind::Decimal, &json!(12.5)).unwrap();
        let b = coerce("total", FieldKind::Decimal, &json!("12.50")).unwrap();
        let (sea_orm::Value::Decimal(Some(a)), sea_orm::Value::Decimal(Some(b))) = (a, b) else {
            panic!("expected decimals");
        };
        assert_eq!(*a, *b);
    }

    #[test]
    fn rejects_wrong_json_type() {
        let err = coerce("is_read", FieldKind::Bool, &json!("yes")).unwrap_err();
        assert_eq!(
            err,
            FieldError::TypeMismatch {
                field: "is_read".into(),
                expected: FieldKind::Bool,
                got: "string",
            }
        );
    }

    #[test]
    fn date_requires_iso_format() {
        assert!(coerce("date", FieldKind::Date, &json!("2024-02-29")).is_ok());
        assert!(coerce("date", FieldKind::Date, &json!("29/02/2024")).is_err());
    }

    #[test]
    fn encodes_keys() {
        assert_eq!(
            encode_value(&sea_orm::Value::String(Some(Box::new("abc".into())))),
            Some("abc".to_string())
        );
        assert_eq!(encode_value(&sea_orm::Value::String(None)), None);
    }
}
