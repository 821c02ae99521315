use serde_json::Value;

use crate::error::{json_type_name, QueryError};
use crate::{Query, AND, FIELD_REF, NOT, OR};

/// Lookup suffix applied to a field (`age__gte`, `name__icontains`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    IsNull,
}

impl Lookup {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "istartswith" => Lookup::IStartsWith,
            "endswith" => Lookup::EndsWith,
            "iendswith" => Lookup::IEndsWith,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "in" => Lookup::In,
            "isnull" => Lookup::IsNull,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::In => "in",
            Lookup::IsNull => "isnull",
        }
    }

    /// Lookups that only make sense on text columns.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Lookup::IExact
                | Lookup::Contains
                | Lookup::IContains
                | Lookup::StartsWith
                | Lookup::IStartsWith
                | Lookup::EndsWith
                | Lookup::IEndsWith
        )
    }

    /// Split `field__suffix` on the last `__` when the suffix is a known lookup.
    /// Anything else is taken verbatim as an `exact` match on the whole key.
    pub fn split_key(key: &str) -> (&str, Lookup) {
        if let Some((field, suffix)) = key.rsplit_once("__") {
            if let Some(lookup) = Lookup::from_suffix(suffix) {
                return (field, lookup);
            }
        }
        (key, Lookup::Exact)
    }
}

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Value(Value),
    Field(String),
}

/// Composable boolean filter over records.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Matches everything.
    True,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        field: String,
        lookup: Lookup,
        operand: Operand,
    },
}

impl Predicate {
    pub fn compare(field: impl Into<String>, lookup: Lookup, operand: Operand) -> Self {
        Predicate::Compare {
            field: field.into(),
            lookup,
            operand,
        }
    }

    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Self::combine(parts, Predicate::And)
    }

    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Self::combine(parts, Predicate::Or)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    // `True` members are identities for both combinators: an empty AND/OR
    // matches everything and never narrows the enclosing predicate.
    fn combine(
        parts: impl IntoIterator<Item = Predicate>,
        wrap: fn(Vec<Predicate>) -> Predicate,
    ) -> Self {
        let mut kept: Vec<Predicate> = parts.into_iter().filter(|p| !p.is_true()).collect();
        match kept.len() {
            0 => Predicate::True,
            1 => kept.remove(0),
            _ => wrap(kept),
        }
    }
}

/// Build a predicate from a query mapping. Top-level keys are ANDed together.
///
/// ```
/// use query_core::{build, Predicate};
/// use serde_json::json;
///
/// let q = json!({"AND": [{"first_name__icontains": "alice"}, {"OR": [{"city": "Boston"}]}]});
/// let p = build(q.as_object().unwrap()).unwrap();
/// assert!(matches!(p, Predicate::And(ref parts) if parts.len() == 2));
/// ```
pub fn build(query: &Query) -> Result<Predicate, QueryError> {
    let mut parts = Vec::with_capacity(query.len());
    for (key, value) in query {
        parts.push(build_entry(key, value)?);
    }
    Ok(Predicate::and(parts))
}

fn build_entry(key: &str, value: &Value) -> Result<Predicate, QueryError> {
    match key {
        AND => Ok(Predicate::and(build_list(key, value)?)),
        OR => Ok(Predicate::or(build_list(key, value)?)),
        NOT => match value {
            Value::Object(sub) => Ok(Predicate::not(build(sub)?)),
            other => Err(malformed(key, "a mapping", other)),
        },
        _ => build_lookup(key, value),
    }
}

fn build_list(key: &str, value: &Value) -> Result<Vec<Predicate>, QueryError> {
    let Value::Array(items) = value else {
        return Err(malformed(key, "a list of mappings", value));
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(sub) => build(sub),
            other => Err(malformed(key, "a list of mappings", other)),
        })
        .collect()
}

fn build_lookup(key: &str, value: &Value) -> Result<Predicate, QueryError> {
    let (field, lookup) = Lookup::split_key(key);
    if field.is_empty() {
        return Err(QueryError::EmptyField(key.to_string()));
    }

    if let Value::Object(wrapper) = value {
        if let Some(negated) = wrapper.get(NOT) {
            return Ok(Predicate::not(Predicate::compare(
                field,
                lookup,
                Operand::Value(negated.clone()),
            )));
        }
        if let Some(other) = wrapper.get(FIELD_REF) {
            return match other {
                Value::String(name) if !name.is_empty() => Ok(Predicate::compare(
                    field,
                    lookup,
                    Operand::Field(name.clone()),
                )),
                _ => Err(QueryError::InvalidFieldRef(key.to_string())),
            };
        }
    }

    Ok(Predicate::compare(field, lookup, Operand::Value(value.clone())))
}

fn malformed(key: &str, expected: &'static str, got: &Value) -> QueryError {
    QueryError::Malformed {
        key: key.to_string(),
        expected,
        got: json_type_name(got),
    }
}
